//! Audio analysis configuration and constants.

/// How the time-domain tap reports the waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSmoothing {
    /// Latest samples, unmodified
    Raw,

    /// Exponential moving average across queries.
    /// `out = out * weight + latest * (1 - weight)`, weight in [0, 1]
    Weighted(f32),
}

impl Default for TimeSmoothing {
    fn default() -> Self {
        Self::Raw
    }
}

/// Spectral analyser configuration (mirrors the Web Audio analyser knobs)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT size of the frequency tap (power of 2, 32..=32768).
    /// Bin count is half of this.
    pub frequency_fft_size: usize,

    /// Number of waveform samples reported by the time tap (power of 2)
    pub time_fft_size: usize,

    /// Lower decibel bound used for normalization (dBFS)
    pub min_db: f32,

    /// Upper decibel bound used for normalization (dBFS)
    pub max_db: f32,

    /// Smoothing between consecutive spectra (0 = none, 1 = frozen)
    pub smoothing_time_constant: f32,

    /// Waveform smoothing policy
    pub time_smoothing: TimeSmoothing,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            frequency_fft_size: 256,
            time_fft_size: 4096,
            min_db: -100.0,
            max_db: -30.0,
            smoothing_time_constant: 0.89,
            time_smoothing: TimeSmoothing::Raw,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per query
    pub fn frequency_bin_count(&self) -> usize {
        self.frequency_fft_size / 2
    }

    /// Samples the shared ring must retain to serve both taps
    pub fn ring_capacity(&self) -> usize {
        self.frequency_fft_size.max(self.time_fft_size)
    }

    /// Validate configuration (FFT sizes must be powers of 2, dB range ordered, etc.)
    pub fn validate(&self) -> Result<(), String> {
        for (name, size) in [
            ("frequency", self.frequency_fft_size),
            ("time", self.time_fft_size),
        ] {
            let allowed = audio_constants::MIN_FFT_SIZE..=audio_constants::MAX_FFT_SIZE;
            if !size.is_power_of_two() || !allowed.contains(&size) {
                return Err(format!(
                    "{} FFT size must be a power of 2 in {}..={}, got {}",
                    name,
                    audio_constants::MIN_FFT_SIZE,
                    audio_constants::MAX_FFT_SIZE,
                    size
                ));
            }
        }
        if !self.min_db.is_finite() || !self.max_db.is_finite() || self.min_db >= self.max_db {
            return Err(format!(
                "Decibel range must be finite with min < max, got {}..{}",
                self.min_db, self.max_db
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "Smoothing time constant must be in [0, 1], got {}",
                self.smoothing_time_constant
            ));
        }
        if let TimeSmoothing::Weighted(weight) = self.time_smoothing {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("Time smoothing weight must be in [0, 1], got {}", weight));
            }
        }
        Ok(())
    }
}

/// Audio constants (compile-time)
pub mod audio_constants {
    /// Synth block size (samples per engine buffer)
    pub const BLOCK_SIZE: usize = 128;

    /// Smallest FFT size accepted by the analyser
    pub const MIN_FFT_SIZE: usize = 32;

    /// Largest FFT size accepted by the analyser
    pub const MAX_FFT_SIZE: usize = 32768;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frequency_bin_count(), 128);
        assert_eq!(config.ring_capacity(), 4096);
    }

    #[test]
    fn test_rejects_bad_fft_sizes() {
        let mut config = AnalyserConfig::default();
        config.frequency_fft_size = 1000;
        assert!(config.validate().is_err());

        config.frequency_fft_size = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_db_range() {
        let config = AnalyserConfig {
            min_db: -30.0,
            max_db: -100.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_weight() {
        let config = AnalyserConfig {
            time_smoothing: TimeSmoothing::Weighted(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
