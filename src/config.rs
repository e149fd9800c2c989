use crate::error::MeterError;
use crate::meter::bar::BarOptions;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHANNELS: usize = 2;
pub const DEFAULT_SMOOTHING: usize = 10;
pub const DEFAULT_AMPLIFY: f32 = 3.5;
pub const DEFAULT_REFRESH_MS: u64 = 10;

/// Upper bounds keep every per-channel and per-window buffer allocatable.
pub const MAX_CHANNELS: usize = 256;
pub const MAX_SMOOTHING: usize = 4096;

/// Pipeline shape, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    pub channels: usize,
    pub smoothing: usize,
    pub amplify: f32,
    pub bar: BarOptions,
}

impl VisualizerConfig {
    pub fn new(
        channels: usize,
        smoothing: usize,
        amplify: f32,
        bar: BarOptions,
    ) -> Result<Self, MeterError> {
        if !(1..=MAX_CHANNELS).contains(&channels) {
            return Err(MeterError::InvalidChannels(channels));
        }
        if !(1..=MAX_SMOOTHING).contains(&smoothing) {
            return Err(MeterError::InvalidSmoothing(smoothing));
        }
        if !(amplify.is_finite() && amplify > 0.0) {
            return Err(MeterError::InvalidAmplify(amplify));
        }

        Ok(Self {
            channels,
            smoothing,
            amplify,
            bar,
        })
    }
}

/// Everything `run` needs besides the pipeline shape
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub visualizer: VisualizerConfig,
    pub device: Option<String>,
    pub block_size: Option<u32>,
    pub refresh: Duration,
}

/// Logging destination and verbosity
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug: bool,
    pub path: PathBuf,
}

impl LogConfig {
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("peakbar.log")
    }
}
