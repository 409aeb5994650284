//! CPU raster counterpart of `GpuCanvas`, backed by a tiny-skia pixmap.

use tiny_skia::Pixmap;
use tracing::debug;

use super::surface::{LayoutSize, Surface};
use super::{GpuDevice, LayerTexture, RenderError, Result};
use crate::audio::AudioAnalysisMetadata;

/// Pixmap sized like the surface, uploaded into the layer after each frame
pub struct CpuCanvas {
    gpu: GpuDevice,
    label: String,
    surface: Surface,
    layer: LayerTexture,
    pixmap: Pixmap,
}

impl CpuCanvas {
    pub fn new(
        gpu: GpuDevice,
        label: &str,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
    ) -> Result<Self> {
        let surface = Surface::new(layout, metadata);
        let (width, height) = surface.size();
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap(width, height))?;
        let layer = LayerTexture::new(&gpu.device, label, surface.size());

        Ok(Self {
            gpu,
            label: label.to_string(),
            surface,
            layer,
            pixmap,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn layer(&self) -> &LayerTexture {
        &self.layer
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Resize the surface and reallocate the pixmap and layer if the pixel size changed
    pub fn resize(&mut self, size: Option<(u32, u32)>) -> Result<bool> {
        if !self.surface.resize(size) {
            return Ok(false);
        }
        let (width, height) = self.surface.size();
        self.pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap(width, height))?;
        self.layer = LayerTexture::new(&self.gpu.device, &self.label, (width, height));
        debug!("{}: pixmap reallocated at {}x{}", self.label, width, height);
        Ok(true)
    }

    /// Start a frame with a transparent pixmap
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Upload the pixmap (premultiplied RGBA8) into the layer texture
    pub fn present(&self) {
        self.layer.write_pixels(&self.gpu.queue, self.pixmap.data());
    }
}
