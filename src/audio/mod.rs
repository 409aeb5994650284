//! Audio feed and spectral analysis.
//!
//! An [`AudioStream`] plays (or captures) audio on the cpal callback thread and
//! pushes the mono mix into a shared [`SampleRing`]. The render thread pulls
//! spectra and waveforms out of the ring through an [`AudioAnalysisSource`].

mod analyser;
mod ring;
mod source;
mod stream;
mod synthesis;

use std::path::PathBuf;
use thiserror::Error;

// Re-export public types
pub use analyser::SpectralAnalyser;
pub use ring::SampleRing;
pub use source::{AnalysisSource, AudioAnalysisData, AudioAnalysisMetadata, AudioAnalysisSource};
pub use stream::{resample_linear, AudioStream, TrackSource};

/// Audio subsystem errors
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio {0} device found")]
    NoDevice(&'static str),

    #[error("Invalid analyser config: {0}")]
    InvalidConfig(String),

    #[error("Failed to read track {path}: {source}")]
    Track {
        path: PathBuf,
        source: hound::Error,
    },

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Synthesis engine error: {0}")]
    Synthesis(String),
}
