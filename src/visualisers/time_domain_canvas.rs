//! Waveform ring rasterized on the CPU with tiny-skia.

use glam::Vec2;
use tiny_skia::{LineJoin, Paint, PathBuilder, Stroke, Transform};
use tracing::error;

use crate::audio::{AudioAnalysisData, AudioAnalysisMetadata};
use crate::geometry::Angle;
use crate::params::TimeDomainParams;
use crate::render::{
    CpuCanvas, GpuDevice, Layer, LayerTexture, LayoutSize, Result, Surface, Visualiser,
};

const STROKE_RGB: [u8; 3] = [231, 76, 60];

/// CPU waveform ring, same geometry as the GPU variant
pub struct TimeDomainRadialCanvas {
    canvas: CpuCanvas,
    params: TimeDomainParams,
}

impl TimeDomainRadialCanvas {
    pub fn new(
        gpu: GpuDevice,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
        params: TimeDomainParams,
    ) -> Result<Self> {
        let canvas = CpuCanvas::new(gpu, "Time Domain Canvas", layout, metadata)?;
        Ok(Self { canvas, params })
    }

    pub fn canvas(&self) -> &CpuCanvas {
        &self.canvas
    }

    /// Trace one half of the ring; `direction` is 1 or -1
    fn trace(&self, samples: &[f32], direction: f32) -> Option<tiny_skia::Path> {
        let surface = self.canvas.surface();
        let center = surface.center();
        let half = surface.min_dim() / 2.0;
        let base = self.params.base_radius * half;
        let scale = self.params.magnitude_scale * half;
        let increment = direction * std::f32::consts::TAU / samples.len() as f32;

        let mut builder = PathBuilder::new();
        for (i, sample) in samples.iter().enumerate() {
            let point = Angle::new(increment * i as f32).point(Vec2::ZERO, base + scale * sample);
            // Pixmap rows grow downward
            let (x, y) = (center.x + point.x, center.y - point.y);
            if i == 0 {
                builder.move_to(x, y);
            } else {
                builder.line_to(x, y);
            }
        }
        builder.finish()
    }
}

impl Visualiser for TimeDomainRadialCanvas {
    fn resize(&mut self, size: Option<(u32, u32)>) {
        if let Err(e) = self.canvas.resize(size) {
            error!("Waveform canvas resize failed: {}", e);
        }
    }

    fn render(&mut self, data: &AudioAnalysisData<'_>) {
        if self.canvas.surface().resize_needed() {
            self.resize(None);
        }

        let samples = data.time_data;
        let paths: Vec<tiny_skia::Path> = if samples.len() < 2 {
            Vec::new()
        } else {
            [1.0, -1.0]
                .into_iter()
                .filter_map(|direction| self.trace(samples, direction))
                .collect()
        };

        let mut paint = Paint::default();
        let [r, g, b] = STROKE_RGB;
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.0,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        self.canvas.clear();
        let pixmap = self.canvas.pixmap_mut();
        for path in &paths {
            pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
        }
        self.canvas.present();
    }

    fn center(&self) -> Vec2 {
        self.canvas.surface().center()
    }

    fn min_dim(&self) -> f32 {
        self.canvas.surface().min_dim()
    }
}

impl Layer for TimeDomainRadialCanvas {
    fn layer_texture(&self) -> &LayerTexture {
        self.canvas.layer()
    }

    fn surface_mut(&mut self) -> &mut Surface {
        self.canvas.surface_mut()
    }
}
