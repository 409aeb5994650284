//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::audio::TrackSource;
use crate::params::{
    AnalyserConfig, LayerConfig, RenderConfig, TimeSmoothing, DEFAULT_BACKGROUND_OPACITY,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "wavering")]
#[command(about = "Audio-reactive radial visualiser", long_about = None)]
pub struct Args {
    /// WAV file to play (defaults to the built-in synth patch)
    #[arg(long, value_name = "WAV", conflicts_with = "input")]
    pub track: Option<PathBuf>,

    /// Visualise the default capture device instead of playing audio
    #[arg(long)]
    pub input: bool,

    /// FFT size of the spectrum (power of 2)
    #[arg(long, value_name = "SIZE", default_value_t = 256)]
    pub frequency_fft_size: usize,

    /// Waveform length in samples (power of 2)
    #[arg(long, value_name = "SIZE", default_value_t = 4096)]
    pub time_fft_size: usize,

    /// Smooth the waveform across frames with this weight (0..=1)
    #[arg(long, value_name = "WEIGHT")]
    pub time_smoothing: Option<f32>,

    /// Rasterize the waveform on the CPU
    #[arg(long)]
    pub canvas_waveform: bool,

    /// Window width (logical pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height (logical pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Backing-store resolution multiplier on top of the display scale
    #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
    pub oversample: f64,

    /// Opacity of the spectrum backdrop (0..=1)
    #[arg(long, value_name = "ALPHA", default_value_t = DEFAULT_BACKGROUND_OPACITY)]
    pub background_opacity: f32,
}

impl Args {
    pub fn track_source(&self) -> TrackSource {
        match (&self.track, self.input) {
            (_, true) => TrackSource::Input,
            (Some(path), false) => TrackSource::Wav(path.clone()),
            (None, false) => TrackSource::Synth,
        }
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            frequency_fft_size: self.frequency_fft_size,
            time_fft_size: self.time_fft_size,
            time_smoothing: self
                .time_smoothing
                .map_or(TimeSmoothing::Raw, TimeSmoothing::Weighted),
            ..AnalyserConfig::default()
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            oversample: self.oversample,
            canvas_waveform: self.canvas_waveform,
            layers: LayerConfig {
                background_opacity: self.background_opacity.clamp(0.0, 1.0),
                ..LayerConfig::default()
            },
        }
    }
}
