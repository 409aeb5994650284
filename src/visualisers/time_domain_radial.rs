//! Waveform ring: two mirrored line strips bent into a circle.

use glam::Vec2;
use tracing::error;

use crate::audio::{AudioAnalysisData, AudioAnalysisMetadata};
use crate::geometry::aspect_scale;
use crate::params::TimeDomainParams;
use crate::render::{
    BufferUsage, DrawCall, GpuCanvas, GpuDevice, Layer, LayerTexture, LayoutSize,
    PipelineOptions, Result, Surface, Visualiser,
};

pub(crate) const VERTEX_SHADER: &str = r#"
struct Uniforms {
    aspect_scale: vec2<f32>,
    base_radius: f32,
    magnitude_scale: f32,
    angular_increment: f32,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

// Instance 1 walks the circle the other way
@vertex
fn vs_main(
    @builtin(instance_index) mirror: u32,
    @location(0) vertex_id: f32,
    @location(1) magnitude: f32,
) -> @builtin(position) vec4<f32> {
    let increment = select(u.angular_increment, -u.angular_increment, mirror == 1u);
    let angle = increment * vertex_id;
    let radius = u.base_radius + u.magnitude_scale * magnitude;
    return vec4<f32>(
        radius * cos(angle) * u.aspect_scale.x,
        radius * sin(angle) * u.aspect_scale.y,
        0.0,
        1.0,
    );
}
"#;

pub(crate) const FRAGMENT_SHADER: &str = r#"
struct Uniforms {
    aspect_scale: vec2<f32>,
    base_radius: f32,
    magnitude_scale: f32,
    angular_increment: f32,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.color;
}
"#;

/// GPU waveform ring
pub struct TimeDomainRadialVisualiser {
    canvas: GpuCanvas,
    params: TimeDomainParams,
    vertex_count: u32,
}

impl TimeDomainRadialVisualiser {
    pub fn new(
        gpu: GpuDevice,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
        params: TimeDomainParams,
    ) -> Result<Self> {
        let mut canvas = GpuCanvas::new(gpu, "Time Domain Radial", layout, metadata);

        let vs = canvas.compile_shader(
            naga::ShaderStage::Vertex,
            "time_domain.vert",
            VERTEX_SHADER,
        );
        let fs = canvas.compile_shader(
            naga::ShaderStage::Fragment,
            "time_domain.frag",
            FRAGMENT_SHADER,
        );
        canvas.link_program(
            &vs,
            &fs,
            &PipelineOptions {
                topology: wgpu::PrimitiveTopology::LineStrip,
                blend: None,
            },
        );

        let vertex_count = metadata.time_fft_size;
        let vertex_ids: Vec<f32> = (0..vertex_count).map(|i| i as f32).collect();
        canvas.upload_float_attribute(&vertex_ids, BufferUsage::Static, "vertex_id", 1)?;
        canvas.set_uniform("color", &params.color);

        let mut visualiser = Self {
            canvas,
            params,
            vertex_count: vertex_count as u32,
        };
        visualiser.update_derived_uniforms();
        Ok(visualiser)
    }

    fn update_derived_uniforms(&mut self) {
        let (width, height) = self.canvas.surface().size();
        let scale = aspect_scale(width as f32, height as f32);
        self.canvas.set_uniform("aspect_scale", &scale.to_array());
    }

    pub fn canvas(&self) -> &GpuCanvas {
        &self.canvas
    }
}

impl Visualiser for TimeDomainRadialVisualiser {
    fn resize(&mut self, size: Option<(u32, u32)>) {
        self.canvas.resize(size);
        self.update_derived_uniforms();
    }

    fn render(&mut self, data: &AudioAnalysisData<'_>) {
        if self.canvas.surface().resize_needed() {
            self.resize(None);
        }

        let samples = &data.time_data[..data.time_data.len().min(self.vertex_count as usize)];
        if let Err(e) =
            self.canvas
                .upload_float_attribute(samples, BufferUsage::Dynamic, "magnitude", 1)
        {
            error!("Waveform upload failed: {}", e);
            return;
        }

        let angular_increment = std::f32::consts::TAU / samples.len().max(1) as f32;
        self.canvas.set_uniform("base_radius", &[self.params.base_radius]);
        self.canvas
            .set_uniform("magnitude_scale", &[self.params.magnitude_scale]);
        self.canvas
            .set_uniform("angular_increment", &[angular_increment]);

        let count = samples.len() as u32;
        self.canvas.draw(&[
            DrawCall::instanced(0..count, 0..1),
            DrawCall::instanced(0..count, 1..2),
        ]);
    }

    fn center(&self) -> Vec2 {
        self.canvas.surface().center()
    }

    fn min_dim(&self) -> f32 {
        self.canvas.surface().min_dim()
    }
}

impl Layer for TimeDomainRadialVisualiser {
    fn layer_texture(&self) -> &LayerTexture {
        self.canvas.layer()
    }

    fn surface_mut(&mut self) -> &mut Surface {
        self.canvas.surface_mut()
    }
}
