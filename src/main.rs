//! Wavering - audio-reactive radial visualiser
//!
//! A waveform ring, a segmented spectrum ring and a spectrum backdrop,
//! each drawn into its own layer and composited onto the window.

use anyhow::Context;
use clap::Parser;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use wavering::audio::{AudioAnalysisSource, AudioStream, SampleRing};
use wavering::cli::Args;
use wavering::params::{BackgroundParams, RadialBarsParams, RenderConfig, TimeDomainParams};
use wavering::render::{Compositor, GpuDevice, Layer, LayoutSize};
use wavering::render_loop::{FrameScheduler, RenderLoopDriver};
use wavering::visualisers::{
    FrequencyDomainBackgroundVisualiser, FrequencyDomainRadialBarsVisualiser,
    TimeDomainRadialCanvas, TimeDomainRadialVisualiser,
};

/// Frames arrive as winit redraw requests
struct WindowScheduler {
    window: Arc<Window>,
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

/// Everything that exists once the window is up
struct Session {
    window: Arc<Window>,
    compositor: Compositor,
    layers: Vec<Box<dyn Layer>>,
    opacities: Vec<f32>,
    driver: RenderLoopDriver<WindowScheduler>,
    source: AudioAnalysisSource,
    stream: AudioStream,
    oversample: f64,
}

impl Session {
    fn new(event_loop: &ActiveEventLoop, args: &Args) -> anyhow::Result<Self> {
        let render_config = args.render_config();
        let analyser_config = args.analyser_config();

        let window_attributes = Window::default_attributes()
            .with_title("Wavering")
            .with_inner_size(winit::dpi::LogicalSize::new(
                render_config.window_width,
                render_config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;
        let gpu = GpuDevice::acquire(&instance, Some(&surface))?;

        let physical = window.inner_size();
        let compositor = Compositor::new(
            gpu.clone(),
            surface,
            (physical.width.max(1), physical.height.max(1)),
        )?;

        // Audio
        let ring = Arc::new(Mutex::new(SampleRing::new(analyser_config.ring_capacity())));
        let source = AudioAnalysisSource::new(&analyser_config, Arc::clone(&ring))?;
        let stream = AudioStream::open(args.track_source(), ring)?;
        let metadata = source.metadata();

        // Layers, bottom first
        let layout = layout_size(&window, render_config.oversample);
        let mut layers: Vec<Box<dyn Layer>> = vec![
            Box::new(FrequencyDomainBackgroundVisualiser::new(
                gpu.clone(),
                layout,
                metadata,
                BackgroundParams::default(),
            )?),
            Box::new(FrequencyDomainRadialBarsVisualiser::new(
                gpu.clone(),
                layout,
                metadata,
                RadialBarsParams::default(),
            )?),
        ];
        if render_config.canvas_waveform {
            layers.push(Box::new(TimeDomainRadialCanvas::new(
                gpu,
                layout,
                metadata,
                TimeDomainParams::default(),
            )?));
        } else {
            layers.push(Box::new(TimeDomainRadialVisualiser::new(
                gpu,
                layout,
                metadata,
                TimeDomainParams::default(),
            )?));
        }
        let opacities = layer_opacities(&render_config);

        let driver = RenderLoopDriver::new(WindowScheduler {
            window: Arc::clone(&window),
        });

        info!(
            "{} layers at {}x{} ({} bins, {} samples)",
            layers.len(),
            physical.width,
            physical.height,
            metadata.frequency_bin_count,
            metadata.time_fft_size
        );

        Ok(Self {
            window,
            compositor,
            layers,
            opacities,
            driver,
            source,
            stream,
            oversample: render_config.oversample,
        })
    }

    fn toggle_playback(&mut self) {
        let result = if self.driver.is_running() {
            self.driver.pause();
            self.stream.pause()
        } else {
            self.driver.start();
            self.stream.play()
        };
        match result {
            Ok(()) => info!(
                "{}",
                if self.driver.is_running() { "Playing" } else { "Paused" }
            ),
            Err(e) => error!("Audio playback toggle failed: {}", e),
        }
    }

    fn resize(&mut self) {
        let layout = layout_size(&self.window, self.oversample);
        for layer in &mut self.layers {
            layer.surface_mut().set_layout(layout);
            layer.resize(None);
        }
        let physical = self.window.inner_size();
        self.compositor
            .resize((physical.width.max(1), physical.height.max(1)));
    }

    /// Returns false when the surface is unusable
    fn redraw(&mut self) -> bool {
        if !self.driver.on_frame(&mut self.source, &mut self.layers) {
            return true;
        }

        let frame: Vec<_> = self
            .layers
            .iter()
            .map(|layer| layer.layer_texture())
            .zip(self.opacities.iter().copied())
            .collect();
        match self.compositor.present(&frame) {
            Ok(()) => true,
            Err(e) => {
                error!("Present failed: {}", e);
                false
            }
        }
    }
}

/// Backing-store size of every layer for the window's current logical size
fn layout_size(window: &Window, oversample: f64) -> LayoutSize {
    let scale_factor = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale_factor);
    LayoutSize::new(logical.width, logical.height, scale_factor * oversample)
}

fn layer_opacities(config: &RenderConfig) -> Vec<f32> {
    vec![
        config.layers.background_opacity,
        config.layers.radial_bars_opacity,
        config.layers.waveform_opacity,
    ]
}

/// Main application state
struct App {
    args: Args,
    session: Option<Session>,
    error: Option<anyhow::Error>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match Session::new(event_loop, &self.args) {
            Ok(session) => {
                info!("Press SPACE to play/pause, ESC to quit");
                self.session = Some(session);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => session.toggle_playback(),
                _ => {}
            },
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                session.resize();
            }
            WindowEvent::RedrawRequested => {
                if !session.redraw() {
                    warn!("Stopping after unrecoverable surface error");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut app = App {
        args,
        session: None,
        error: None,
    };

    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
