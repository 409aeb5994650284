//! Per-frame scheduling of the visualisers.
//!
//! The driver never blocks. It asks its scheduler for a frame, and the host
//! calls [`RenderLoopDriver::on_frame`] when that frame arrives. Only one
//! request is outstanding at a time.

use tracing::debug;

use crate::audio::AnalysisSource;
use crate::render::Visualiser;

/// Host hook that arranges for `on_frame` to be called once more
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Paused,
    Running,
}

/// Drives every renderer from one analysis snapshot per frame
pub struct RenderLoopDriver<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    frame_pending: bool,
}

impl<S: FrameScheduler> RenderLoopDriver<S> {
    /// Starts paused
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: LoopState::Paused,
            frame_pending: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        debug!("Render loop running");
        self.request_frame();
    }

    /// Takes effect at the next frame callback
    pub fn pause(&mut self) {
        if self.state == LoopState::Paused {
            return;
        }
        self.state = LoopState::Paused;
        debug!("Render loop paused");
    }

    /// Handle a frame callback. Returns whether the renderers drew.
    pub fn on_frame<V>(
        &mut self,
        source: &mut dyn AnalysisSource,
        renderers: &mut [Box<V>],
    ) -> bool
    where
        V: Visualiser + ?Sized,
    {
        self.frame_pending = false;
        if self.state != LoopState::Running {
            return false;
        }

        self.request_frame();
        let data = source.snapshot();
        for renderer in renderers.iter_mut() {
            renderer.render(&data);
        }
        true
    }

    fn request_frame(&mut self) {
        if self.frame_pending {
            return;
        }
        self.frame_pending = true;
        self.scheduler.request_frame();
    }
}
