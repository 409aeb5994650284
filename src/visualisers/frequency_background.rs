//! Full-screen backdrop lit by the spectrum, low frequencies at the bottom.

use glam::Vec2;

use super::{pack_vec4, vec4_count};
use crate::audio::{AudioAnalysisData, AudioAnalysisMetadata};
use crate::params::BackgroundParams;
use crate::render::{
    BufferUsage, DrawCall, GpuCanvas, GpuDevice, Layer, LayerTexture, LayoutSize,
    PipelineOptions, Result, ShaderTemplate, Surface, Visualiser,
};

pub(crate) const VERTEX_SHADER: &str = r#"
// Corners 0..3 of a triangle strip covering clip space
@vertex
fn vs_main(@location(0) index: f32) -> @builtin(position) vec4<f32> {
    let corner = u32(index);
    let x = select(-1.0, 1.0, corner == 1u || corner == 3u);
    let y = select(-1.0, 1.0, corner < 2u);
    return vec4<f32>(x, y, 0.0, 1.0);
}
"#;

pub(crate) const FRAGMENT_TEMPLATE: ShaderTemplate = ShaderTemplate::new(
    r#"
struct Uniforms {
    min_max_db: vec2<f32>,
    dimensions: vec2<f32>,
    magnitudes: array<vec4<f32>, MAGNITUDE_VECS>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

const BINS: i32 = FREQUENCY_BINS;

// Neighbours past either end reuse the edge bin
fn magnitude(index: i32) -> f32 {
    let i = u32(clamp(index, 0, BINS - 1));
    return clamp(u.magnitudes[i / 4u][i % 4u], u.min_max_db.x, u.min_max_db.y);
}

fn normalize_db(db: f32) -> f32 {
    return clamp((db - u.min_max_db.x) / (u.min_max_db.y - u.min_max_db.x), 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let along = 1.0 - frag.y / u.dimensions.y;
    let across = frag.x / u.dimensions.x;

    let index_float = along * f32(BINS);
    let index = clamp(i32(index_float), 0, BINS - 1);
    let column = clamp(index_float - f32(index), 0.0, 1.0);

    let prev_weight = max(0.0, 0.5 - column);
    let curr_weight = (1.0 - 2.0 * abs(0.5 - column)) * 0.5 + 0.5;
    let next_weight = max(0.0, column - 0.5);

    let c = normalize_db(
        prev_weight * magnitude(index - 1)
            + curr_weight * magnitude(index)
            + next_weight * magnitude(index + 1),
    );

    let edge = 2.0 * abs(0.5 - across);
    let fade = mix(0.01, 1.0, edge * edge * edge * edge * edge);
    return vec4<f32>(c * c, 0.75 * c * c * c, 0.5 * c * c * c * c, fade);
}
"#,
    &["FREQUENCY_BINS", "MAGNITUDE_VECS"],
);

/// GPU spectrum backdrop
pub struct FrequencyDomainBackgroundVisualiser {
    canvas: GpuCanvas,
}

impl FrequencyDomainBackgroundVisualiser {
    pub fn new(
        gpu: GpuDevice,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
        params: BackgroundParams,
    ) -> Result<Self> {
        let bins = (metadata.frequency_bin_count as f32 * params.frequency_cutoff) as usize;
        let metadata = metadata.with_frequency_bin_count(bins.max(1));
        let bins = metadata.frequency_bin_count;

        let fragment_source = FRAGMENT_TEMPLATE.instantiate(&[
            ("FREQUENCY_BINS", bins.to_string()),
            ("MAGNITUDE_VECS", vec4_count(bins).to_string()),
        ])?;

        let mut canvas = GpuCanvas::new(gpu, "Frequency Background", layout, metadata);
        let vs = canvas.compile_shader(
            naga::ShaderStage::Vertex,
            "background.vert",
            VERTEX_SHADER,
        );
        let fs = canvas.compile_shader(
            naga::ShaderStage::Fragment,
            "background.frag",
            &fragment_source,
        );
        canvas.link_program(
            &vs,
            &fs,
            &PipelineOptions {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            },
        );

        canvas.upload_float_attribute(&[0.0, 1.0, 2.0, 3.0], BufferUsage::Static, "index", 1)?;
        canvas.set_uniform("min_max_db", &[metadata.min_db, metadata.max_db]);

        let mut visualiser = Self { canvas };
        visualiser.update_derived_uniforms();
        Ok(visualiser)
    }

    fn update_derived_uniforms(&mut self) {
        let (width, height) = self.canvas.surface().size();
        self.canvas
            .set_uniform("dimensions", &[width as f32, height as f32]);
    }

    pub fn canvas(&self) -> &GpuCanvas {
        &self.canvas
    }
}

impl Visualiser for FrequencyDomainBackgroundVisualiser {
    fn resize(&mut self, size: Option<(u32, u32)>) {
        self.canvas.resize(size);
        self.update_derived_uniforms();
    }

    fn render(&mut self, data: &AudioAnalysisData<'_>) {
        if self.canvas.surface().resize_needed() {
            self.resize(None);
        }

        let surface = self.canvas.surface();
        let bins = surface.frequency_bin_count().min(data.frequency_data.len());
        let magnitudes = pack_vec4(&data.frequency_data[..bins], surface.min_db());
        self.canvas.set_uniform_array("magnitudes", &magnitudes, 4);
        self.canvas.draw(&[DrawCall::new(0..4)]);
    }

    fn center(&self) -> Vec2 {
        self.canvas.surface().center()
    }

    fn min_dim(&self) -> f32 {
        self.canvas.surface().min_dim()
    }
}

impl Layer for FrequencyDomainBackgroundVisualiser {
    fn layer_texture(&self) -> &LayerTexture {
        self.canvas.layer()
    }

    fn surface_mut(&mut self) -> &mut Surface {
        self.canvas.surface_mut()
    }
}
