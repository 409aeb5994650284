//! Window and layer composition configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (logical pixels)
    pub window_width: u32,

    /// Initial window height (logical pixels)
    pub window_height: u32,

    /// Extra backing-store resolution on top of the display scale factor
    pub oversample: f64,

    /// Draw the waveform with the CPU rasterizer instead of the GPU
    pub canvas_waveform: bool,

    /// Layer stack, bottom first
    pub layers: LayerConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            oversample: 1.0,
            canvas_waveform: false,
            layers: LayerConfig::default(),
        }
    }
}

pub const DEFAULT_BACKGROUND_OPACITY: f32 = 0.06;

/// Opacity of each layer when composited (0..=1)
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// The backdrop only tints what sits on top of it
    pub background_opacity: f32,
    pub radial_bars_opacity: f32,
    pub waveform_opacity: f32,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            background_opacity: DEFAULT_BACKGROUND_OPACITY,
            radial_bars_opacity: 1.0,
            waveform_opacity: 1.0,
        }
    }
}
