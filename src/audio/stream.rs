//! cpal stream that plays or captures audio and feeds the sample ring.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use super::ring::SampleRing;
use super::synthesis::Synth;
use super::AudioError;

/// Where the audio comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TrackSource {
    /// Built-in procedural patch
    Synth,
    /// WAV file, played once
    Wav(PathBuf),
    /// Default capture device (nothing is played back)
    Input,
}

/// Running audio stream. Dropping it stops the audio.
pub struct AudioStream {
    stream: cpal::Stream,
    /// Output callbacks emit silence and hold their position while false
    playing: Arc<AtomicBool>,
}

impl AudioStream {
    /// Open the default device for `source`. The stream starts paused.
    pub fn open(source: TrackSource, ring: Arc<Mutex<SampleRing>>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let playing = Arc::new(AtomicBool::new(false));

        let (stream, sample_rate) = match source {
            TrackSource::Input => build_input(&host, ring)?,
            TrackSource::Synth => {
                let device = host
                    .default_output_device()
                    .ok_or(AudioError::NoDevice("output"))?;
                let config = output_config(&device)?;
                let mut synth = Synth::new(config.sample_rate.0 as usize)?;
                let stream = build_output(&device, &config, ring, Arc::clone(&playing), move || {
                    Some(synth.next_frame())
                })?;
                (stream, config.sample_rate.0)
            }
            TrackSource::Wav(path) => {
                let device = host
                    .default_output_device()
                    .ok_or(AudioError::NoDevice("output"))?;
                let config = output_config(&device)?;
                let track = load_track(&path, config.sample_rate.0)?;
                let mut frames = track.into_iter();
                let stream = build_output(&device, &config, ring, Arc::clone(&playing), move || {
                    frames.next()
                })?;
                (stream, config.sample_rate.0)
            }
        };

        // Some hosts start streams immediately
        stream
            .pause()
            .unwrap_or_else(|e| debug!("Stream pause not supported: {}", e));

        debug!("Audio stream open at {}Hz", sample_rate);
        Ok(Self { stream, playing })
    }

    pub fn play(&self) -> Result<(), AudioError> {
        self.playing.store(true, Ordering::Relaxed);
        self.stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.playing.store(false, Ordering::Relaxed);
        match self.stream.pause() {
            Ok(()) => Ok(()),
            // The gate above already silences the output
            Err(cpal::PauseStreamError::DeviceNotAvailable) => {
                Err(AudioError::Stream("device not available".to_string()))
            }
            Err(e) => {
                debug!("Stream pause not supported: {}", e);
                Ok(())
            }
        }
    }
}

fn output_config(device: &cpal::Device) -> Result<cpal::StreamConfig, AudioError> {
    let config = device
        .default_output_config()
        .map_err(|e| AudioError::Stream(format!("Failed to get output config: {}", e)))?;

    info!(
        "Audio out: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    Ok(config.into())
}

/// Build an output stream pulling stereo frames from `next_frame` until it runs dry
fn build_output<F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<Mutex<SampleRing>>,
    playing: Arc<AtomicBool>,
    mut next_frame: F,
) -> Result<cpal::Stream, AudioError>
where
    F: FnMut() -> Option<[f32; 2]> + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let mut mono = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !playing.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }

                mono.clear();
                for frame in data.chunks_mut(channels) {
                    let [left, right] = next_frame().unwrap_or([0.0, 0.0]);
                    for (c, sample) in frame.iter_mut().enumerate() {
                        *sample = if c % 2 == 0 { left } else { right };
                    }
                    mono.push((left + right) * 0.5);
                }

                let mut ring = ring.lock().unwrap_or_else(|e| e.into_inner());
                ring.push(&mono);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::Stream(format!("Failed to build output stream: {}", e)))
}

fn build_input(
    host: &cpal::Host,
    ring: Arc<Mutex<SampleRing>>,
) -> Result<(cpal::Stream, u32), AudioError> {
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoDevice("input"))?;
    let config: cpal::StreamConfig = device
        .default_input_config()
        .map_err(|e| AudioError::Stream(format!("Failed to get input config: {}", e)))?
        .into();

    info!(
        "Audio in: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate.0
    );

    let channels = config.channels.max(1) as usize;
    let mut mono = Vec::new();
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                mono.clear();
                mono.extend(
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                );
                let mut ring = ring.lock().unwrap_or_else(|e| e.into_inner());
                ring.push(&mono);
            },
            |err| error!("Audio input error: {}", err),
            None,
        )
        .map_err(|e| AudioError::Stream(format!("Failed to build input stream: {}", e)))?;

    Ok((stream, config.sample_rate.0))
}

/// Decode a WAV file into stereo frames at `target_rate`
fn load_track(path: &Path, target_rate: u32) -> Result<Vec<[f32; 2]>, AudioError> {
    let track_error = |source| AudioError::Track {
        path: path.to_path_buf(),
        source,
    };

    let reader = hound::WavReader::open(path).map_err(track_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(track_error)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(track_error)?
        }
    };

    let resampled = resample_linear(&samples, channels, spec.sample_rate, target_rate);
    info!(
        "Track {}: {} ch @ {}Hz, {:.1}s",
        path.display(),
        channels,
        spec.sample_rate,
        resampled.len() as f32 / channels as f32 / target_rate as f32
    );

    Ok(resampled
        .chunks(channels)
        .map(|frame| [frame[0], frame[frame.len().min(2) - 1]])
        .collect())
}

/// Linearly resample interleaved audio from `from_rate` to `to_rate`
pub fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    if from_rate == to_rate || frames == 0 || from_rate == 0 || to_rate == 0 {
        return samples[..frames * channels].to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_frames = ((frames as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let position = i as f64 * ratio;
        let index = position.floor() as usize;
        let next = (index + 1).min(frames - 1);
        let t = (position - index as f64) as f32;
        for c in 0..channels {
            let a = samples[index * channels + c];
            let b = samples[next * channels + c];
            out.push(a + (b - a) * t);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity() {
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample_linear(&samples, 2, 44100, 44100), samples.to_vec());
    }

    #[test]
    fn test_resample_upsamples_by_interpolation() {
        let out = resample_linear(&[0.0, 1.0, 0.0], 1, 1, 2);
        assert_eq!(out.len(), 6);
        assert_eq!(&out[..4], &[0.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_resample_downsample_keeps_channels() {
        let stereo: Vec<f32> = (0..8).flat_map(|i| [i as f32, -(i as f32)]).collect();
        let out = resample_linear(&stereo, 2, 2, 1);
        assert_eq!(out, vec![0.0, 0.0, 2.0, -2.0, 4.0, -4.0, 6.0, -6.0]);
    }

    #[test]
    fn test_resample_drops_partial_frame() {
        let out = resample_linear(&[0.1, 0.2, 0.3], 2, 48000, 48000);
        assert_eq!(out, vec![0.1, 0.2]);
    }

    #[test]
    fn test_missing_track_reports_path() {
        let err = load_track(Path::new("/nonexistent/track.wav"), 48000).unwrap_err();
        match err {
            AudioError::Track { path, .. } => assert_eq!(path, PathBuf::from("/nonexistent/track.wav")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_track_round_trip() {
        let path = std::env::temp_dir().join("wavering_load_track_test.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..80 {
            writer.write_sample(i16::MAX / 2).unwrap();
        }
        writer.finalize().unwrap();

        let frames = load_track(&path, 16000).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(frames.len(), 160);
        // Mono duplicates into both channels
        assert!((frames[10][0] - 0.5).abs() < 1e-3);
        assert_eq!(frames[10][0], frames[10][1]);
    }
}
