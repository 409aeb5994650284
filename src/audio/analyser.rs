//! Windowed FFT producing a smoothed decibel spectrum.
//!
//! Matches the browser analyser: Blackman window, magnitudes scaled by 1/N,
//! exponential smoothing between queries, then conversion to dB. Silent bins
//! come out as negative infinity and are left for the caller to clamp.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Blackman window coefficient (alpha = 0.16)
const BLACKMAN_ALPHA: f32 = 0.16;

/// Frequency-domain tap
pub struct SpectralAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes carried between queries
    smoothed: Vec<f32>,
    smoothing_time_constant: f32,
}

impl SpectralAnalyser {
    pub fn new(fft_size: usize, smoothing_time_constant: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft,
            window: (0..fft_size).map(|i| blackman_window(i, fft_size)).collect(),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing_time_constant: smoothing_time_constant.clamp(0.0, 1.0),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Analyse the latest `fft_size` samples into `out` (one dB value per bin).
    ///
    /// `samples` shorter than the FFT size are treated as zero-padded at the front.
    pub fn process(&mut self, samples: &[f32], out: &mut [f32]) {
        let size = self.window.len();
        let padding = size.saturating_sub(samples.len());
        let samples = &samples[samples.len().saturating_sub(size)..];

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < padding { 0.0 } else { samples[i - padding] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / size as f32;
        let tau = self.smoothing_time_constant;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            // Keep NaN/inf from latching into the history
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }

        for (slot, smoothed) in out.iter_mut().zip(&self.smoothed) {
            *slot = 20.0 * smoothed.log10();
        }
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

/// Blackman window function
fn blackman_window(index: usize, size: usize) -> f32 {
    let a0 = (1.0 - BLACKMAN_ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = BLACKMAN_ALPHA / 2.0;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_sine_peaks_in_its_bin() {
        let mut analyser = SpectralAnalyser::new(256, 0.0);
        let mut out = vec![0.0; analyser.frequency_bin_count()];
        analyser.process(&sine(20, 256, 0.5), &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(20));
        assert!(out[20] > -30.0, "peak = {} dB", out[20]);
    }

    #[test]
    fn test_silence_is_negative_infinity() {
        let mut analyser = SpectralAnalyser::new(64, 0.8);
        let mut out = vec![0.0; 32];
        analyser.process(&[0.0; 64], &mut out);
        assert!(out.iter().all(|&db| db == f32::NEG_INFINITY));
    }

    #[test]
    fn test_smoothing_decays_toward_silence() {
        let mut analyser = SpectralAnalyser::new(128, 0.5);
        let mut loud = vec![0.0; 64];
        analyser.process(&sine(8, 128, 1.0), &mut loud);

        let mut decayed = vec![0.0; 64];
        analyser.process(&[0.0; 128], &mut decayed);
        // Half the magnitude is about -6 dB
        assert!((loud[8] - decayed[8] - 6.02).abs() < 0.1);

        analyser.reset();
        analyser.process(&[0.0; 128], &mut decayed);
        assert_eq!(decayed[8], f32::NEG_INFINITY);
    }

    #[test]
    fn test_short_input_is_padded() {
        let mut analyser = SpectralAnalyser::new(64, 0.0);
        let mut out = vec![0.0; 32];
        analyser.process(&[], &mut out);
        assert!(out.iter().all(|&db| db == f32::NEG_INFINITY));
    }

    #[test]
    fn test_blackman_window_shape() {
        assert!(blackman_window(0, 256).abs() < 1e-6);
        assert!((blackman_window(128, 256) - 1.0).abs() < 1e-5);
    }
}
