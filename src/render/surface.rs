//! Drawable surface sizing and analysis metadata shared by all visualisers.

use glam::Vec2;
use tracing::debug;

use crate::audio::AudioAnalysisMetadata;

/// Size of the host container, in logical units plus the display scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSize {
    pub width: f64,
    pub height: f64,
    /// Physical pixels per logical unit (display scale times any oversampling)
    pub scale_factor: f64,
}

impl LayoutSize {
    pub fn new(width: f64, height: f64, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Layout from a physical pixel size at scale 1
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64, 1.0)
    }

    /// Backing-store size in pixels, at least 1x1
    pub fn physical(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        let px = |logical: f64| (logical * scale).round().max(1.0) as u32;
        (px(self.width), px(self.height))
    }
}

/// Pixel dimensions plus the metadata of the source a visualiser renders
#[derive(Debug, Clone)]
pub struct Surface {
    layout: LayoutSize,
    width: u32,
    height: u32,
    /// Set by an explicit resize; holds the size until the layout changes
    pinned: bool,
    metadata: AudioAnalysisMetadata,
}

impl Surface {
    /// Surface sized to `layout`
    pub fn new(layout: LayoutSize, metadata: AudioAnalysisMetadata) -> Self {
        let (width, height) = layout.physical();
        Self {
            layout,
            width,
            height,
            pinned: false,
            metadata,
        }
    }

    /// Record the host container size. Takes effect on the next `resize(None)`.
    ///
    /// A changed layout releases any explicit size.
    pub fn set_layout(&mut self, layout: LayoutSize) {
        if layout != self.layout {
            self.pinned = false;
        }
        self.layout = layout;
    }

    pub fn layout(&self) -> LayoutSize {
        self.layout
    }

    /// Set the backing size explicitly or from the layout. Returns true if it changed.
    pub fn resize(&mut self, size: Option<(u32, u32)>) -> bool {
        let (width, height) = match size {
            Some((w, h)) => (w.max(1), h.max(1)),
            None => self.layout.physical(),
        };
        self.pinned = size.is_some();
        if (width, height) == (self.width, self.height) {
            return false;
        }
        debug!(
            "Surface resized {}x{} -> {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;
        true
    }

    /// True if the backing size no longer matches the host layout and no
    /// explicit size is in effect
    pub fn resize_needed(&self) -> bool {
        !self.pinned && self.layout.physical() != (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn min_dim(&self) -> f32 {
        self.width.min(self.height) as f32
    }

    pub fn metadata(&self) -> AudioAnalysisMetadata {
        self.metadata
    }

    /// Only the first `bins` frequency bins are rendered from now on
    pub fn restrict_frequency_bins(&mut self, bins: usize) {
        self.metadata = self.metadata.with_frequency_bin_count(bins);
    }

    pub fn min_db(&self) -> f32 {
        self.metadata.min_db
    }

    pub fn max_db(&self) -> f32 {
        self.metadata.max_db
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.metadata.frequency_bin_count
    }

    pub fn time_fft_size(&self) -> usize {
        self.metadata.time_fft_size
    }
}
