//! Per-layer visual parameters.

/// One stop of a colour ramp: RGB from a hex triple plus alpha, at a position in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// 0xRRGGBB
    pub rgb: u32,
    pub alpha: f32,
    /// Position along the ramp (0 = inner edge of the ring, 1 = outer edge)
    pub position: f32,
}

impl ColorStop {
    pub const fn new(rgb: u32, alpha: f32, position: f32) -> Self {
        Self {
            rgb,
            alpha,
            position,
        }
    }
}

/// Waveform ring parameters (shared by the GPU and CPU variants)
#[derive(Debug, Clone)]
pub struct TimeDomainParams {
    /// Ring radius in clip units (1.0 = half the min dimension)
    pub base_radius: f32,

    /// Radius change per unit sample amplitude (clip units)
    pub magnitude_scale: f32,

    /// Line colour, RGBA
    pub color: [f32; 4],
}

impl Default for TimeDomainParams {
    fn default() -> Self {
        let base_radius = 0.2;
        Self {
            base_radius,
            magnitude_scale: base_radius * 0.5,
            color: [0.905, 0.298, 0.235, 0.5],
        }
    }
}

/// Segmented spectrum ring parameters
#[derive(Debug, Clone)]
pub struct RadialBarsParams {
    /// Segments per bar
    pub bar_divs: usize,

    /// Fraction of the bins drawn (the high-frequency tail is dropped)
    pub frequency_cutoff: f32,

    /// Angular gap on each side of a wedge, as a fraction of the wedge angle
    pub wedge_gap_percent: f32,

    /// Base radius at silence, as a fraction of half the min dimension
    pub min_radius_portion: f32,

    /// Base radius at full intensity, as a fraction of half the min dimension
    pub max_radius_portion: f32,

    /// Radial extent of bands plus gaps, as a fraction of half the min dimension
    pub ring_span_portion: f32,

    /// Budget for the gaps between segments, as a fraction of half the min dimension
    pub gap_span_portion: f32,

    /// Width of the innermost gap (pixels)
    pub gap_start_px: f32,

    /// Colour ramp across the whole ring
    pub colors: Vec<ColorStop>,
}

impl Default for RadialBarsParams {
    fn default() -> Self {
        Self {
            bar_divs: 28,
            frequency_cutoff: 0.74,
            wedge_gap_percent: 0.1,
            min_radius_portion: 0.15,
            max_radius_portion: 0.50,
            ring_span_portion: 0.55,
            gap_span_portion: 0.20,
            gap_start_px: 2.0,
            colors: vec![
                ColorStop::new(0x00D1B1, 0.0, 0.0),
                ColorStop::new(0xABE300, 0.7, 0.2),
                ColorStop::new(0xFF8400, 1.0, 0.65),
                ColorStop::new(0xFF2D00, 1.0, 1.0),
            ],
        }
    }
}

/// Ambient backdrop parameters
#[derive(Debug, Clone)]
pub struct BackgroundParams {
    /// Fraction of the bins mapped onto the screen height
    pub frequency_cutoff: f32,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            frequency_cutoff: 0.725,
        }
    }
}
