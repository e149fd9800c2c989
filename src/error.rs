use crate::config::{MAX_CHANNELS, MAX_SMOOTHING};
use std::io;
use thiserror::Error;

/// Setup-time failures. Nothing raised on the audio thread ends up here.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("channel count must be at least 1 and at most {max} (got {0})", max = MAX_CHANNELS)]
    InvalidChannels(usize),

    #[error("smoothing depth must be at least 1 and at most {max} (got {0})", max = MAX_SMOOTHING)]
    InvalidSmoothing(usize),

    #[error("amplification factor must be a positive number (got {0})")]
    InvalidAmplify(f32),

    #[error("no audio input device found")]
    NoInputDevice,

    #[error("failed to enumerate audio devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("input device has no usable configuration: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format: {0:?}")]
    SampleFormat(cpal::SampleFormat),

    #[error("failed to open audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}
