//! Offscreen rendering against a real adapter. Every test skips when none is available.

use wavering::audio::{AudioAnalysisData, AudioAnalysisMetadata};
use wavering::params::{BackgroundParams, RadialBarsParams, TimeDomainParams};
use wavering::render::{
    BufferUsage, DrawCall, GpuCanvas, GpuDevice, Layer, LayoutSize, PipelineOptions, Visualiser,
};
use wavering::visualisers::{
    FrequencyDomainBackgroundVisualiser, FrequencyDomainRadialBarsVisualiser,
    TimeDomainRadialCanvas, TimeDomainRadialVisualiser,
};

const SOLID_VERTEX: &str = r#"
struct Uniforms {
    offset: vec2<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position + u.offset, 0.0, 1.0);
}
"#;

const SOLID_FRAGMENT: &str = r#"
struct Uniforms {
    offset: vec2<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.color;
}
"#;

fn gpu_or_skip() -> Option<GpuDevice> {
    match GpuDevice::headless() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("SKIP: no GPU adapter available ({})", e);
            None
        }
    }
}

fn metadata() -> AudioAnalysisMetadata {
    AudioAnalysisMetadata {
        min_db: -100.0,
        max_db: -30.0,
        frequency_bin_count: 128,
        time_fft_size: 256,
    }
}

fn linked_canvas(gpu: GpuDevice) -> GpuCanvas {
    let mut canvas = GpuCanvas::new(gpu, "test", LayoutSize::from_pixels(16, 16), metadata());
    let vs = canvas.compile_shader(naga::ShaderStage::Vertex, "solid.vert", SOLID_VERTEX);
    let fs = canvas.compile_shader(naga::ShaderStage::Fragment, "solid.frag", SOLID_FRAGMENT);
    assert!(vs.compile_status() && fs.compile_status());
    assert!(canvas.link_program(
        &vs,
        &fs,
        &PipelineOptions {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            blend: None,
        },
    ));
    canvas
}

#[test]
fn test_broken_shader_reports_log() {
    let Some(gpu) = gpu_or_skip() else { return };
    let canvas = GpuCanvas::new(gpu, "test", LayoutSize::from_pixels(8, 8), metadata());

    let shader = canvas.compile_shader(
        naga::ShaderStage::Fragment,
        "broken.frag",
        "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0; }",
    );
    assert!(!shader.compile_status());
    assert!(!shader.info_log().is_empty());
}

#[test]
fn test_failed_link_only_clears() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut canvas = GpuCanvas::new(gpu.clone(), "test", LayoutSize::from_pixels(8, 8), metadata());

    let vs = canvas.compile_shader(naga::ShaderStage::Vertex, "solid.vert", SOLID_VERTEX);
    let fs = canvas.compile_shader(naga::ShaderStage::Fragment, "broken.frag", "fn oops(");
    assert!(!canvas.link_program(&vs, &fs, &PipelineOptions::default()));
    assert!(!canvas.link_status());
    assert!(!canvas.program_info_log().is_empty());

    canvas.set_clear_color(wgpu::Color::RED);
    canvas.draw(&[DrawCall::new(0..3)]);
    let pixels = canvas.layer().read_pixels(&gpu);
    assert_eq!(pixels.len(), 8 * 8 * 4);
    assert!(pixels.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
}

#[test]
fn test_full_screen_quad_fills_layer() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut canvas = linked_canvas(gpu.clone());

    let quad = [-1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0];
    canvas
        .upload_float_attribute(&quad, BufferUsage::Static, "position", 2)
        .unwrap();
    canvas.set_uniform("color", &[0.0, 1.0, 0.0, 1.0]);
    canvas.draw(&[DrawCall::new(0..4)]);

    let pixels = canvas.layer().read_pixels(&gpu);
    assert!(pixels.chunks_exact(4).all(|p| p == [0, 255, 0, 255]));
}

#[test]
fn test_attribute_and_uniform_tables() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut canvas = linked_canvas(gpu);

    assert_eq!(canvas.attribute_location("position"), Some(0));
    assert_eq!(canvas.attribute_location("missing"), None);
    assert!(canvas.uniform_location("color").is_some());
    assert!(canvas.uniform_location("missing").is_none());

    // Wrong component count is refused
    assert!(canvas
        .upload_float_attribute(&[0.0; 6], BufferUsage::Static, "position", 3)
        .is_err());
    assert!(canvas
        .upload_float_attribute(&[0.0; 6], BufferUsage::Static, "missing", 2)
        .is_err());

    canvas.set_uniform("offset", &[0.25, -0.5]);
    canvas.set_uniform("missing", &[1.0]);
    assert_eq!(canvas.uniform_values("offset"), Some(vec![0.25, -0.5]));
}

#[test]
fn test_resize_is_idempotent_and_recreates_layer() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut canvas = GpuCanvas::new(gpu, "test", LayoutSize::from_pixels(32, 16), metadata());
    let first = canvas.layer().generation();

    assert!(!canvas.resize(None));
    assert_eq!(canvas.layer().generation(), first);

    assert!(canvas.resize(Some((40, 20))));
    assert_eq!(canvas.layer().size(), (40, 20));
    assert_eq!(canvas.viewport(), (40, 20));
    let second = canvas.layer().generation();
    assert_ne!(second, first);

    assert!(!canvas.resize(Some((40, 20))));
    assert_eq!(canvas.layer().generation(), second);
}

fn loud_frame() -> (Vec<f32>, Vec<f32>) {
    (vec![-30.0; 128], vec![0.0; 256])
}

#[test]
fn test_background_renders() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = FrequencyDomainBackgroundVisualiser::new(
        gpu.clone(),
        LayoutSize::from_pixels(64, 48),
        metadata(),
        BackgroundParams::default(),
    )
    .unwrap();

    let (frequency, time) = loud_frame();
    layer.render(&AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    });

    let pixels = layer.layer_texture().read_pixels(&gpu);
    assert_eq!(pixels.len(), 64 * 48 * 4);
    assert!(pixels.iter().any(|&b| b != 0));
}

#[test]
fn test_radial_bars_render() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = FrequencyDomainRadialBarsVisualiser::new(
        gpu.clone(),
        LayoutSize::from_pixels(256, 256),
        metadata(),
        RadialBarsParams::default(),
    )
    .unwrap();

    let (frequency, time) = loud_frame();
    let data = AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    };
    layer.render(&data);
    layer.render(&data);

    let pixels = layer.layer_texture().read_pixels(&gpu);
    assert_eq!(pixels.len(), 256 * 256 * 4);
    assert!(pixels.iter().any(|&b| b != 0));

    // Full loudness puts the ring at half the scaling radius, 64px out
    for (i, pixel) in pixels.chunks_exact(4).enumerate() {
        if pixel.iter().any(|&b| b != 0) {
            let x = (i % 256) as f32 + 0.5 - 128.0;
            let y = (i / 256) as f32 + 0.5 - 128.0;
            assert!(x.hypot(y) > 62.0, "lit pixel inside the ring at ({}, {})", x, y);
        }
    }
    let center = (128 * 256 + 128) * 4;
    assert_eq!(&pixels[center..center + 4], &[0, 0, 0, 0]);
}

#[test]
fn test_radial_bars_resize_keeps_uniforms() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = FrequencyDomainRadialBarsVisualiser::new(
        gpu,
        LayoutSize::from_pixels(64, 64),
        metadata(),
        RadialBarsParams::default(),
    )
    .unwrap();

    layer.surface_mut().set_layout(LayoutSize::from_pixels(120, 80));
    layer.resize(None);
    let center = layer.canvas().uniform_values("center");
    let dimensions = layer.canvas().uniform_values("dimensions");
    assert_eq!(center, Some(vec![60.0, 40.0]));
    assert_eq!(dimensions, Some(vec![120.0, 80.0]));

    layer.resize(None);
    assert_eq!(layer.canvas().uniform_values("center"), center);
    assert_eq!(layer.canvas().uniform_values("dimensions"), dimensions);
}

#[test]
fn test_waveform_ring_resize_keeps_aspect() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = TimeDomainRadialVisualiser::new(
        gpu,
        LayoutSize::from_pixels(80, 40),
        metadata(),
        TimeDomainParams::default(),
    )
    .unwrap();

    let aspect = layer.canvas().uniform_values("aspect_scale");
    assert_eq!(aspect, Some(vec![0.5, 1.0]));
    layer.resize(None);
    layer.resize(None);
    assert_eq!(layer.canvas().uniform_values("aspect_scale"), aspect);
    assert_eq!(layer.center(), glam::Vec2::new(40.0, 20.0));
    assert_eq!(layer.canvas().layer().size(), (80, 40));
}

#[test]
fn test_explicit_size_survives_render() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = TimeDomainRadialVisualiser::new(
        gpu,
        LayoutSize::from_pixels(64, 64),
        metadata(),
        TimeDomainParams::default(),
    )
    .unwrap();

    layer.resize(Some((40, 20)));
    let (frequency, time) = loud_frame();
    let data = AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    };
    layer.render(&data);
    assert_eq!(layer.layer_texture().size(), (40, 20));
    assert_eq!(
        layer.canvas().uniform_values("aspect_scale"),
        Some(vec![0.5, 1.0])
    );

    // A new layout takes over again
    layer.surface_mut().set_layout(LayoutSize::from_pixels(32, 32));
    layer.render(&data);
    assert_eq!(layer.layer_texture().size(), (32, 32));
}

#[test]
fn test_background_explicit_size_survives_render() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = FrequencyDomainBackgroundVisualiser::new(
        gpu,
        LayoutSize::from_pixels(64, 48),
        metadata(),
        BackgroundParams::default(),
    )
    .unwrap();

    layer.resize(Some((30, 10)));
    let (frequency, time) = loud_frame();
    layer.render(&AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    });
    assert_eq!(layer.layer_texture().size(), (30, 10));
    assert_eq!(
        layer.canvas().uniform_values("dimensions"),
        Some(vec![30.0, 10.0])
    );
}

#[test]
fn test_waveform_ring_renders() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = TimeDomainRadialVisualiser::new(
        gpu.clone(),
        LayoutSize::from_pixels(64, 64),
        metadata(),
        TimeDomainParams::default(),
    )
    .unwrap();

    let (frequency, time) = loud_frame();
    layer.render(&AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    });

    let pixels = layer.layer_texture().read_pixels(&gpu);
    assert!(pixels.iter().any(|&b| b != 0));
    // Ring only, the center stays clear
    let center = (32 * 64 + 32) * 4;
    assert_eq!(&pixels[center..center + 4], &[0, 0, 0, 0]);
}

#[test]
fn test_canvas_waveform_renders_and_follows_layout() {
    let Some(gpu) = gpu_or_skip() else { return };
    let mut layer = TimeDomainRadialCanvas::new(
        gpu.clone(),
        LayoutSize::from_pixels(64, 64),
        metadata(),
        TimeDomainParams::default(),
    )
    .unwrap();

    let (frequency, time) = loud_frame();
    let data = AudioAnalysisData {
        frequency_data: &frequency,
        time_data: &time,
    };
    layer.render(&data);
    assert!(layer.layer_texture().read_pixels(&gpu).iter().any(|&b| b != 0));

    // A new host layout is picked up on the next frame
    layer.surface_mut().set_layout(LayoutSize::from_pixels(80, 40));
    layer.render(&data);
    assert_eq!(layer.layer_texture().size(), (80, 40));
    assert_eq!(layer.center(), glam::Vec2::new(40.0, 20.0));
}
