//! Per-callback signal path: peak, accumulate, smooth.

use super::accumulator::{BlockAccumulator, PipelineClock};
use super::peak::peak_interleaved;
use super::smoothing::SmoothingWindow;
use crate::config::VisualizerConfig;
use cpal::{FromSample, Sample};

/// All state touched by the audio callback, sized once at startup.
pub struct Pipeline {
    accumulator: BlockAccumulator,
    windows: Vec<SmoothingWindow>,
    levels: Vec<f32>,
}

impl Pipeline {
    pub fn new(config: &VisualizerConfig, clock: PipelineClock) -> Self {
        let channels = config.channels;
        Self {
            accumulator: BlockAccumulator::new(channels, config.amplify, clock),
            windows: (0..channels)
                .map(|_| SmoothingWindow::new(config.smoothing))
                .collect(),
            levels: vec![0.0; channels],
        }
    }

    /// Run one callback of `frames` frames. `peak_of(c)` returns the block
    /// peak for channel `c`; channels are visited in index order.
    ///
    /// Returns the smoothed levels when this callback completes a display
    /// cycle.
    pub fn process_with<F>(&mut self, frames: usize, mut peak_of: F) -> Option<&[f32]>
    where
        F: FnMut(usize) -> f32,
    {
        for channel in 0..self.windows.len() {
            self.accumulator.add(channel, peak_of(channel));
        }

        if !self.accumulator.finish_block(frames) {
            return None;
        }

        for (channel, window) in self.windows.iter_mut().enumerate() {
            window.push(self.accumulator.drain(channel));
            self.levels[channel] = window.average();
        }
        Some(&self.levels)
    }

    /// Interleaved input as delivered by the audio host. Channels past
    /// `device_channels` read as silence.
    pub fn process_interleaved<T>(&mut self, data: &[T], device_channels: usize) -> Option<&[f32]>
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let frames = if device_channels == 0 {
            0
        } else {
            data.len() / device_channels
        };
        self.process_with(frames, |channel| {
            peak_interleaved(data, device_channels, channel)
        })
    }

    pub fn clock(&self) -> &PipelineClock {
        self.accumulator.clock()
    }
}
