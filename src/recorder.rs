//! Microphone capture for audio inputs, using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use hound::{WavSpec, WavWriter};
use log::{error, info};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::{BITS_PER_SAMPLE, CHANNELS};
use crate::model::AudioBlob;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No input device available")]
    NoInputDevice,
    #[error("Failed to get default input config: {0}")]
    ConfigError(String),
    #[error("Failed to build input stream: {0}")]
    StreamError(String),
    #[error("Failed to encode WAV: {0}")]
    EncodingError(String),
    #[error("Recording already in progress")]
    AlreadyRecording,
    #[error("Not currently recording")]
    NotRecording,
}

/// Mono samples shared with the capture callback
pub type SampleBuffer = Arc<Mutex<Vec<i16>>>;

/// Recording state shared between the UI thread and the cpal callback
#[derive(Clone)]
pub struct RecordingState {
    pub is_recording: Arc<AtomicBool>,
    pub samples: SampleBuffer,
    pub actual_sample_rate: Arc<AtomicU32>,
}

impl RecordingState {
    pub fn new() -> Self {
        Self {
            is_recording: Arc::new(AtomicBool::new(false)),
            samples: Arc::new(Mutex::new(Vec::new())),
            actual_sample_rate: Arc::new(AtomicU32::new(16000)),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::Relaxed)
    }
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Start recording audio from the default input device.
/// The returned stream must be kept alive until `stop_recording`.
pub fn start_recording(state: &RecordingState) -> Result<cpal::Stream, AudioError> {
    if state.is_recording() {
        return Err(AudioError::AlreadyRecording);
    }

    if let Ok(mut samples) = state.samples.lock() {
        samples.clear();
    }

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoInputDevice)?;

    info!("🎤 Using input device: {}", device.name().unwrap_or_default());

    let config = device
        .default_input_config()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    info!("📊 Sample format: {:?}, Rate: {:?}", config.sample_format(), config.sample_rate());

    let channels = config.channels() as u32;
    state.actual_sample_rate.store(config.sample_rate().0, Ordering::Relaxed);

    let is_recording = state.is_recording.clone();
    let samples = state.samples.clone();

    let stream = match config.sample_format() {
        SampleFormat::I16 => build_stream(&device, &config.into(), samples, is_recording, channels, |s: i16| s as f32 / 32768.0)?,
        SampleFormat::F32 => build_stream(&device, &config.into(), samples, is_recording, channels, |s: f32| s)?,
        format => return Err(AudioError::ConfigError(format!("Unsupported format: {:?}", format))),
    };

    stream.play().map_err(|e| AudioError::StreamError(e.to_string()))?;
    state.is_recording.store(true, Ordering::Relaxed);

    info!("🔴 Recording started");
    Ok(stream)
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: SampleBuffer,
    is_recording: Arc<AtomicBool>,
    channels: u32,
    to_f32: F,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + Send + 'static,
    F: Fn(T) -> f32 + Send + 'static,
{
    let err_fn = |err| error!("Stream error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !is_recording.load(Ordering::Relaxed) {
                    return;
                }

                if let Ok(mut guard) = samples.lock() {
                    guard.extend(data.chunks_exact(channels as usize).map(|frame| {
                        let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
                        mix_to_i16(sum / channels as f32)
                    }));
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamError(e.to_string()))
}

fn mix_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Stop recording and package the capture as a WAV blob.
/// `target_rate` resamples the capture; `None` keeps the device rate.
pub fn stop_recording(state: &RecordingState, target_rate: Option<u32>) -> Result<AudioBlob, AudioError> {
    if !state.is_recording() {
        return Err(AudioError::NotRecording);
    }

    state.is_recording.store(false, Ordering::Relaxed);
    info!("⏹️ Recording stopped");

    let samples = state
        .samples
        .lock()
        .map_err(|_| AudioError::EncodingError("Failed to lock samples".to_string()))?
        .clone();

    if samples.is_empty() {
        return Err(AudioError::EncodingError("No audio captured".to_string()));
    }

    let sample_rate = state.actual_sample_rate.load(Ordering::Relaxed);
    info!("📦 Encoding {} samples captured at {} Hz", samples.len(), sample_rate);

    let wav = encode_wav(&samples, sample_rate, target_rate.unwrap_or(sample_rate))?;
    Ok(AudioBlob::new(recording_filename(), "audio/wav", wav))
}

fn recording_filename() -> String {
    format!("recording_{}.wav", chrono::Local::now().format("%Y-%m-%dT%H-%M-%S-%3f"))
}

fn encode_wav(samples: &[i16], original_rate: u32, target_rate: u32) -> Result<Vec<u8>, AudioError> {
    let processed = if original_rate != target_rate {
        info!("🔄 Resampling from {}Hz to {}Hz", original_rate, target_rate);
        resample(samples, original_rate, target_rate)
    } else {
        samples.to_vec()
    };

    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: target_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::EncodingError(e.to_string()))?;

        for &sample in &processed {
            writer
                .write_sample(sample)
                .map_err(|e| AudioError::EncodingError(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| AudioError::EncodingError(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Linear interpolation between neighbouring samples.
fn resample(samples: &[i16], from: u32, to: u32) -> Vec<i16> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let ratio = from as f64 / to as f64;
    let target_len = (samples.len() as f64 / ratio) as usize;
    let mut result = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let pos = i as f64 * ratio;
        let index = pos as usize;

        if index + 1 < samples.len() {
            let fract = pos - index as f64;
            let s1 = samples[index] as f64;
            let s2 = samples[index + 1] as f64;
            result.push((s1 + (s2 - s1) * fract) as i16);
        } else if index < samples.len() {
            result.push(samples[index]);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<i16> = (0..480).map(|i| i as i16).collect();
        let out = resample(&samples, 48000, 24000);
        assert_eq!(out.len(), 240);
        assert_eq!(out[1], 2);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![1i16, -1, 5];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_encode_wav_header() {
        let samples = vec![0i16; 1600];
        let wav = encode_wav(&samples, 16000, 16000).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.duration(), 1600);
    }

    #[test]
    fn test_stop_without_start_is_rejected() {
        let state = RecordingState::new();
        assert!(matches!(stop_recording(&state, None), Err(AudioError::NotRecording)));
    }

    #[test]
    fn test_stop_with_samples_yields_wav_blob() {
        let state = RecordingState::new();
        state.actual_sample_rate.store(32000, Ordering::Relaxed);
        state.samples.lock().unwrap().extend(std::iter::repeat(100i16).take(3200));
        state.is_recording.store(true, Ordering::Relaxed);

        let blob = stop_recording(&state, Some(16000)).unwrap();
        assert_eq!(blob.mime, "audio/wav");
        assert!(blob.filename.starts_with("recording_"));
        assert!(blob.filename.ends_with(".wav"));
        assert!(!state.is_recording());

        let reader = hound::WavReader::new(Cursor::new(blob.bytes.to_vec())).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.duration(), 1600);
    }

    #[test]
    fn test_mix_clamps() {
        assert_eq!(mix_to_i16(2.0), 32767);
        assert_eq!(mix_to_i16(-2.0), -32768);
    }
}
