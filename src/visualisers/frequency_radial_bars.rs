//! Spectrum ring of segmented radial bars that breathes with loudness.

use glam::Vec2;
use tracing::debug;

use super::{pack_vec4, vec4_count};
use crate::audio::{AudioAnalysisData, AudioAnalysisMetadata};
use crate::geometry::{
    generate_radial_bar_radii, generate_segmented_bar_mesh, hex_to_rgb, intensity,
    pick_gap_upper_bound,
};
use crate::params::RadialBarsParams;
use crate::render::{
    BufferUsage, DrawCall, GpuCanvas, GpuDevice, Layer, LayerTexture, LayoutSize,
    PipelineOptions, Result, ShaderTemplate, Surface, Visualiser,
};

macro_rules! radial_bar_uniforms {
    () => {
        r#"
struct ColorStop {
    color: vec4<f32>,
    position: f32,
}

struct Uniforms {
    min_max_db: vec2<f32>,
    dimensions: vec2<f32>,
    center: vec2<f32>,
    // Inner and outer radius of each segment band in xy (pixels)
    bar_radii: array<vec4<f32>, BAR_DIVS>,
    magnitudes: array<vec4<f32>, MAGNITUDE_VECS>,
    colors: array<ColorStop, COLOR_STOPS>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) @interpolate(flat) magnitude: f32,
    @location(1) @interpolate(flat) angles: vec2<f32>,
    @location(2) @interpolate(flat) radii: vec2<f32>,
    @location(3) @interpolate(flat) segment: f32,
}
"#
    };
}

pub(crate) const PLACEHOLDERS: &[&str] = &["BAR_DIVS", "MAGNITUDE_VECS", "COLOR_STOPS"];

pub(crate) const VERTEX_TEMPLATE: ShaderTemplate = ShaderTemplate::new(
    concat!(
        radial_bar_uniforms!(),
        r#"
fn normalize_db(db: f32) -> f32 {
    return clamp((db - u.min_max_db.x) / (u.min_max_db.y - u.min_max_db.x), 0.0, 1.0);
}

fn magnitude(index: u32) -> f32 {
    return u.magnitudes[index / 4u][index % 4u];
}

// index: (wedge, segment, corner); bar_angles: wedge angle span
@vertex
fn vs_main(@location(0) index: vec3<f32>, @location(1) bar_angles: vec2<f32>) -> VertexOutput {
    let wedge = u32(index.x);
    let corner = u32(index.z);
    let radii = u.bar_radii[u32(index.y)].xy;

    let hi = max(bar_angles.x, bar_angles.y);
    let lo = min(bar_angles.x, bar_angles.y);
    var angle = hi;
    var radius = radii.x;
    switch corner {
        case 1u: {
            angle = lo;
        }
        case 2u, 3u: {
            angle = lo;
            radius = radii.y;
        }
        case 4u: {
            radius = radii.y;
        }
        default: {}
    }

    let min_dim = min(u.dimensions.x, u.dimensions.y);
    let aspect = vec2<f32>(min_dim / u.dimensions.x, min_dim / u.dimensions.y);
    let clip_radius = radius / (min_dim / 2.0);

    var output: VertexOutput;
    output.position = vec4<f32>(
        cos(angle) * clip_radius * aspect.x,
        sin(angle) * clip_radius * aspect.y,
        0.0,
        1.0,
    );
    output.magnitude = normalize_db(magnitude(wedge));
    output.angles = bar_angles;
    output.radii = radii;
    output.segment = index.y;
    return output;
}
"#
    ),
    PLACEHOLDERS,
);

pub(crate) const FRAGMENT_TEMPLATE: ShaderTemplate = ShaderTemplate::new(
    concat!(
        radial_bar_uniforms!(),
        r#"
const PI: f32 = 3.141592653589793;
const RADIAL_FADE: f32 = 0.15;
const ANGULAR_FADE: f32 = 0.10;

// Piecewise-linear ramp across the whole ring; fades out past the last stop
fn ramp_color(radius: f32, bounds: vec2<f32>) -> vec4<f32> {
    let t = clamp((radius - bounds.x) / (bounds.y - bounds.x), 0.0, 1.0);
    var last = ColorStop(vec4<f32>(0.0), 0.0);
    for (var i = 0u; i < COLOR_STOPS; i++) {
        let stop = u.colors[i];
        if (t <= stop.position) {
            let span = max(stop.position - last.position, 1e-6);
            return mix(last.color, stop.color, (t - last.position) / span);
        }
        last = stop;
    }
    let tail = max(1.0 - last.position, 1e-6);
    return mix(last.color, vec4<f32>(0.0), (t - last.position) / tail);
}

// Angle in (-2pi, 0], matching the clockwise wedge layout
fn clockwise_angle(p: vec2<f32>) -> f32 {
    let a = atan2(p.y, p.x);
    return select(a, a - 2.0 * PI, a > 0.0);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    // Framebuffer y points down; the ring is laid out with y up
    let p = vec2<f32>(input.position.x - u.center.x, u.center.y - input.position.y);
    let radius = length(p);

    let raw_segments = input.magnitude * f32(BAR_DIVS);
    let last_segment = floor(raw_segments);
    let partial = raw_segments - last_segment;

    let inner = input.radii.x;
    var outer = input.radii.y;
    if (input.segment == last_segment) {
        outer = inner + partial * (outer - inner);
    }
    if (input.segment > last_segment || outer <= inner || radius < inner || radius > outer) {
        discard;
    }

    var color = ramp_color(radius, vec2<f32>(u.bar_radii[0].x, u.bar_radii[BAR_DIVS - 1].y));

    let radial_delta = min(radius - inner, outer - radius) / (outer - inner);
    if (radial_delta < RADIAL_FADE) {
        color.a *= radial_delta / RADIAL_FADE;
    }

    let bounds = input.angles;
    let angle = clockwise_angle(p);
    let angular_delta = min(abs(bounds.x - angle), abs(bounds.y - angle)) / abs(bounds.y - bounds.x);
    if (angular_delta < ANGULAR_FADE) {
        color.a *= angular_delta / ANGULAR_FADE;
    }

    return color;
}
"#
    ),
    PLACEHOLDERS,
);

/// Additive blend: `src * src_alpha + dst`
const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// GPU segmented spectrum ring
pub struct FrequencyDomainRadialBarsVisualiser {
    canvas: GpuCanvas,
    params: RadialBarsParams,
    vertex_count: u32,
}

impl FrequencyDomainRadialBarsVisualiser {
    pub fn new(
        gpu: GpuDevice,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
        params: RadialBarsParams,
    ) -> Result<Self> {
        let bins = (metadata.frequency_bin_count as f32 * params.frequency_cutoff).floor() as usize;
        let metadata = metadata.with_frequency_bin_count(bins.max(1));
        let bins = metadata.frequency_bin_count;

        let substitutions = [
            ("BAR_DIVS", params.bar_divs.max(1).to_string()),
            ("MAGNITUDE_VECS", vec4_count(bins).to_string()),
            ("COLOR_STOPS", params.colors.len().max(1).to_string()),
        ];
        let vertex_source = VERTEX_TEMPLATE.instantiate(&substitutions)?;
        let fragment_source = FRAGMENT_TEMPLATE.instantiate(&substitutions)?;

        let mut canvas = GpuCanvas::new(gpu, "Frequency Radial Bars", layout, metadata);
        let vs = canvas.compile_shader(
            naga::ShaderStage::Vertex,
            "radial_bars.vert",
            &vertex_source,
        );
        let fs = canvas.compile_shader(
            naga::ShaderStage::Fragment,
            "radial_bars.frag",
            &fragment_source,
        );
        canvas.link_program(
            &vs,
            &fs,
            &PipelineOptions {
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: Some(ADDITIVE_BLEND),
            },
        );

        // Static mesh: one wedge per bin
        let mesh = generate_segmented_bar_mesh(bins, params.wedge_gap_percent, params.bar_divs);
        canvas.upload_float_attribute(&mesh.index_attribute(), BufferUsage::Static, "index", 3)?;
        canvas.upload_float_attribute(
            &mesh.angle_attribute(),
            BufferUsage::Static,
            "bar_angles",
            2,
        )?;
        debug!(
            "Radial bars: {} wedges x {} segments, {} vertices",
            bins,
            params.bar_divs,
            mesh.vertex_count()
        );

        canvas.set_uniform("min_max_db", &[metadata.min_db, metadata.max_db]);
        let colors: Vec<f32> = params
            .colors
            .iter()
            .flat_map(|stop| {
                let [r, g, b] = hex_to_rgb(stop.rgb);
                [r, g, b, stop.alpha, stop.position, 0.0, 0.0, 0.0]
            })
            .collect();
        canvas.set_uniform_array("colors", &colors, 8);

        let mut visualiser = Self {
            canvas,
            params,
            vertex_count: mesh.vertex_count() as u32,
        };
        visualiser.update_derived_uniforms();
        Ok(visualiser)
    }

    fn update_derived_uniforms(&mut self) {
        let surface = self.canvas.surface();
        let center = surface.center();
        let (width, height) = surface.size();
        self.canvas.set_uniform("center", &center.to_array());
        self.canvas
            .set_uniform("dimensions", &[width as f32, height as f32]);
    }

    pub fn canvas(&self) -> &GpuCanvas {
        &self.canvas
    }
}

/// Band radii (pixels) for the surface size and loudness of the whole spectrum,
/// flattened as (inner, outer) pairs
fn band_radii(params: &RadialBarsParams, surface: &Surface, frequency_data: &[f32]) -> Vec<f32> {
    let scaling_dim = surface.min_dim() / 2.0;

    let loudness = intensity(frequency_data, surface.min_db(), surface.max_db());
    let base_radius = scaling_dim
        * (params.min_radius_portion
            + loudness * (params.max_radius_portion - params.min_radius_portion));

    let gap_budget = scaling_dim * params.gap_span_portion;
    let gap_start = params
        .gap_start_px
        .min(gap_budget / params.bar_divs.max(1) as f32);
    let gap_range = Vec2::new(
        gap_start,
        pick_gap_upper_bound(gap_start, params.bar_divs, gap_budget),
    );

    let radius_range = Vec2::new(
        base_radius,
        base_radius + scaling_dim * params.ring_span_portion,
    );
    generate_radial_bar_radii(params.bar_divs, gap_range, radius_range)
        .iter()
        .flat_map(|band| [band.inner, band.outer])
        .collect()
}

impl Visualiser for FrequencyDomainRadialBarsVisualiser {
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
        // Wedges stop at the cutoff; loudness reads every bin
        let magnitudes = pack_vec4(&data.frequency_data[..bins], surface.min_db());
        let radii = band_radii(&self.params, surface, data.frequency_data);
        self.canvas.set_uniform_array("magnitudes", &magnitudes, 4);
        self.canvas.set_uniform_array("bar_radii", &radii, 2);

        self.canvas.draw(&[DrawCall::new(0..self.vertex_count)]);
    }

    fn center(&self) -> Vec2 {
        self.canvas.surface().center()
    }

    fn min_dim(&self) -> f32 {
        self.canvas.surface().min_dim()
    }
}

impl Layer for FrequencyDomainRadialBarsVisualiser {
    fn layer_texture(&self) -> &LayerTexture {
        self.canvas.layer()
    }

    fn surface_mut(&mut self) -> &mut Surface {
        self.canvas.surface_mut()
    }
}
