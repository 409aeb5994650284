//! Per-frame analysis snapshots for the visualisers.

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::analyser::SpectralAnalyser;
use super::ring::SampleRing;
use super::AudioError;
use crate::params::{AnalyserConfig, TimeSmoothing};

/// Static description of what a source produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioAnalysisMetadata {
    /// Lower bound of the normalization range (dB)
    pub min_db: f32,
    /// Upper bound of the normalization range (dB)
    pub max_db: f32,
    /// Length of every frequency array
    pub frequency_bin_count: usize,
    /// Length of every time-domain array
    pub time_fft_size: usize,
}

impl AudioAnalysisMetadata {
    /// Copy restricted to the first `bins` frequency bins
    pub fn with_frequency_bin_count(self, bins: usize) -> Self {
        Self {
            frequency_bin_count: bins.min(self.frequency_bin_count),
            ..self
        }
    }
}

/// One frame of analysis data. Borrowed from the source and only valid for the frame.
#[derive(Debug, Clone, Copy)]
pub struct AudioAnalysisData<'a> {
    /// Decibels per bin, unclamped (silence is `-inf`)
    pub frequency_data: &'a [f32],
    /// Waveform samples in [-1, 1]
    pub time_data: &'a [f32],
}

/// Anything the render loop can pull analysis frames from
pub trait AnalysisSource {
    fn metadata(&self) -> AudioAnalysisMetadata;

    /// Refresh both taps once and return the arrays every renderer sees this frame
    fn snapshot(&mut self) -> AudioAnalysisData<'_>;
}

/// Frequency and time taps over a shared sample feed
pub struct AudioAnalysisSource {
    ring: Arc<Mutex<SampleRing>>,
    analyser: SpectralAnalyser,
    time_smoothing: TimeSmoothing,
    metadata: AudioAnalysisMetadata,

    /// Reused sample window for the frequency tap
    frequency_input: Vec<f32>,
    frequency_data: Vec<f32>,
    time_data: Vec<f32>,
    time_data_weighted: Vec<f32>,
}

impl AudioAnalysisSource {
    pub fn new(config: &AnalyserConfig, ring: Arc<Mutex<SampleRing>>) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::InvalidConfig)?;

        let metadata = AudioAnalysisMetadata {
            min_db: config.min_db,
            max_db: config.max_db,
            frequency_bin_count: config.frequency_bin_count(),
            time_fft_size: config.time_fft_size,
        };
        debug!(?metadata, "Audio analysis source created");

        Ok(Self {
            ring,
            analyser: SpectralAnalyser::new(
                config.frequency_fft_size,
                config.smoothing_time_constant,
            ),
            time_smoothing: config.time_smoothing,
            metadata,
            frequency_input: vec![0.0; config.frequency_fft_size],
            frequency_data: vec![0.0; metadata.frequency_bin_count],
            time_data: vec![0.0; config.time_fft_size],
            time_data_weighted: vec![0.0; config.time_fft_size],
        })
    }

    /// Latest decibel spectrum
    pub fn frequency_data(&mut self) -> &[f32] {
        self.refresh_frequency();
        &self.frequency_data
    }

    /// Latest waveform
    pub fn time_data(&mut self) -> &[f32] {
        self.refresh_time();
        &self.time_data
    }

    /// Waveform averaged across queries: `out = out * weight + latest * (1 - weight)`
    pub fn time_data_weighted(&mut self, weight: f32) -> &[f32] {
        self.refresh_time();
        self.apply_weight(weight);
        &self.time_data_weighted
    }

    pub fn metadata(&self) -> AudioAnalysisMetadata {
        self.metadata
    }

    fn refresh_frequency(&mut self) {
        {
            let ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
            ring.copy_latest(&mut self.frequency_input);
        }
        self.analyser
            .process(&self.frequency_input, &mut self.frequency_data);
    }

    fn refresh_time(&mut self) {
        let ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        ring.copy_latest(&mut self.time_data);
    }

    fn apply_weight(&mut self, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        for (out, latest) in self.time_data_weighted.iter_mut().zip(&self.time_data) {
            *out = *out * weight + latest * (1.0 - weight);
        }
    }
}

impl AnalysisSource for AudioAnalysisSource {
    fn metadata(&self) -> AudioAnalysisMetadata {
        self.metadata
    }

    fn snapshot(&mut self) -> AudioAnalysisData<'_> {
        self.refresh_frequency();
        self.refresh_time();

        let time_data = match self.time_smoothing {
            TimeSmoothing::Raw => &self.time_data,
            TimeSmoothing::Weighted(weight) => {
                self.apply_weight(weight);
                &self.time_data_weighted
            }
        };

        AudioAnalysisData {
            frequency_data: &self.frequency_data,
            time_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with(config: AnalyserConfig) -> (AudioAnalysisSource, Arc<Mutex<SampleRing>>) {
        let ring = Arc::new(Mutex::new(SampleRing::new(config.ring_capacity())));
        let source = AudioAnalysisSource::new(&config, Arc::clone(&ring)).unwrap();
        (source, ring)
    }

    #[test]
    fn test_metadata_matches_config() {
        let (source, _) = source_with(AnalyserConfig::default());
        let metadata = source.metadata();
        assert_eq!(metadata.frequency_bin_count, 128);
        assert_eq!(metadata.time_fft_size, 4096);
        assert_eq!(metadata.min_db, -100.0);
        assert_eq!(metadata.max_db, -30.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalyserConfig {
            frequency_fft_size: 100,
            ..Default::default()
        };
        let ring = Arc::new(Mutex::new(SampleRing::new(128)));
        assert!(matches!(
            AudioAnalysisSource::new(&config, ring),
            Err(AudioError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_snapshot_lengths() {
        let (mut source, ring) = source_with(AnalyserConfig::default());
        ring.lock().unwrap().push(&[0.25; 512]);

        let data = source.snapshot();
        assert_eq!(data.frequency_data.len(), 128);
        assert_eq!(data.time_data.len(), 4096);
        assert_eq!(data.time_data[4095], 0.25);
        // Not enough history yet
        assert_eq!(data.time_data[0], 0.0);
    }

    #[test]
    fn test_silence_reports_negative_infinity() {
        let (mut source, _) = source_with(AnalyserConfig::default());
        assert!(source
            .frequency_data()
            .iter()
            .all(|&db| db == f32::NEG_INFINITY));
    }

    #[test]
    fn test_weighted_time_data_converges() {
        let config = AnalyserConfig {
            time_fft_size: 64,
            ..Default::default()
        };
        let (mut source, ring) = source_with(config);
        ring.lock().unwrap().push(&[0.5; 256]);

        let first = source.time_data_weighted(0.5)[0];
        assert!((first - 0.25).abs() < 1e-6);

        let mut last = first;
        for _ in 0..20 {
            last = source.time_data_weighted(0.5)[0];
        }
        assert!((last - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_weight_is_clamped() {
        let config = AnalyserConfig {
            time_fft_size: 32,
            ..Default::default()
        };
        let (mut source, ring) = source_with(config);
        ring.lock().unwrap().push(&[1.0; 256]);
        // Negative weight acts as 0: output equals the input
        assert_eq!(source.time_data_weighted(-3.0)[0], 1.0);
    }

    #[test]
    fn test_snapshot_uses_time_smoothing_policy() {
        let config = AnalyserConfig {
            time_fft_size: 32,
            time_smoothing: TimeSmoothing::Weighted(0.75),
            ..Default::default()
        };
        let (mut source, ring) = source_with(config);
        ring.lock().unwrap().push(&[1.0; 256]);
        let data = source.snapshot();
        assert!((data.time_data[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_restricted_metadata() {
        let (source, _) = source_with(AnalyserConfig::default());
        let cut = source.metadata().with_frequency_bin_count(94);
        assert_eq!(cut.frequency_bin_count, 94);
        assert_eq!(cut.time_fft_size, 4096);
        let clamped = source.metadata().with_frequency_bin_count(1000);
        assert_eq!(clamped.frequency_bin_count, 128);
    }
}
