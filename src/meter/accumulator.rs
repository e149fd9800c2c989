//! Block-rate down-sampling.
//!
//! Audio hosts hand out blocks of whatever size the hardware is running at,
//! often well under a millisecond. The accumulator sums amplified block peaks
//! until roughly [`TARGET_FRAMES`] frames have gone by and then emits their
//! mean, so the display updates at a steady cadence regardless of block size.

/// Frames of audio per emitted display sample.
pub const TARGET_FRAMES: usize = 512;

/// Blocks needed to cover [`TARGET_FRAMES`] at the given block size.
pub const fn emit_threshold(block_size: usize) -> usize {
    if block_size == 0 || block_size > TARGET_FRAMES {
        return 1;
    }
    TARGET_FRAMES / block_size
}

/// Counts callbacks between emissions.
///
/// The threshold is armed once from the first known block size and never
/// recomputed. A later block of a different size only sets the drift flag.
#[derive(Debug)]
pub struct PipelineClock {
    block_counter: usize,
    emit_threshold: usize,
    block_size: Option<usize>,
    drifted: bool,
}

impl PipelineClock {
    pub fn new() -> Self {
        Self {
            block_counter: 0,
            emit_threshold: 1,
            block_size: None,
            drifted: false,
        }
    }

    /// Clock armed up front from a block size the host promised.
    pub fn with_block_size(block_size: usize) -> Self {
        let mut clock = Self::new();
        clock.arm(block_size);
        clock
    }

    fn arm(&mut self, block_size: usize) {
        self.block_size = Some(block_size);
        self.emit_threshold = emit_threshold(block_size);
    }

    /// Register one callback of `frames` frames. Returns true when this
    /// callback completes an emission cycle; the counter is reset then.
    pub fn tick(&mut self, frames: usize) -> bool {
        match self.block_size {
            None => self.arm(frames),
            Some(size) if size != frames => self.drifted = true,
            Some(_) => {}
        }

        self.block_counter += 1;
        if self.block_counter >= self.emit_threshold {
            self.block_counter = 0;
            true
        } else {
            false
        }
    }

    pub fn emit_threshold(&self) -> usize {
        self.emit_threshold
    }

    /// Whether a block arrived whose size differs from the armed one.
    pub fn drifted(&self) -> bool {
        self.drifted
    }
}

impl Default for PipelineClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel running sums of amplified block peaks.
#[derive(Debug)]
pub struct BlockAccumulator {
    sums: Vec<f32>,
    amplify: f32,
    clock: PipelineClock,
}

impl BlockAccumulator {
    pub fn new(channels: usize, amplify: f32, clock: PipelineClock) -> Self {
        Self {
            sums: vec![0.0; channels],
            amplify,
            clock,
        }
    }

    /// Add one block peak for `channel`.
    pub fn add(&mut self, channel: usize, peak: f32) {
        if let Some(sum) = self.sums.get_mut(channel) {
            *sum += peak * self.amplify;
        }
    }

    /// Close out a callback. True when display samples are ready to drain.
    pub fn finish_block(&mut self, frames: usize) -> bool {
        self.clock.tick(frames)
    }

    /// Mean of the accumulated peaks for `channel`; resets its sum.
    pub fn drain(&mut self, channel: usize) -> f32 {
        let threshold = self.clock.emit_threshold() as f32;
        match self.sums.get_mut(channel) {
            Some(sum) => std::mem::take(sum) / threshold,
            None => 0.0,
        }
    }

    pub fn clock(&self) -> &PipelineClock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_from_block_size() {
        assert_eq!(emit_threshold(64), 8);
        assert_eq!(emit_threshold(128), 4);
        assert_eq!(emit_threshold(512), 1);
        assert_eq!(emit_threshold(300), 1);
        assert_eq!(emit_threshold(1024), 1);
        assert_eq!(emit_threshold(0), 1);
    }

    #[test]
    fn clock_arms_on_first_block() {
        let mut clock = PipelineClock::new();
        assert!(!clock.tick(128));
        assert_eq!(clock.emit_threshold(), 4);
        assert!(!clock.tick(128));
        assert!(!clock.tick(128));
        assert!(clock.tick(128));
        assert!(!clock.drifted());
        // counter restarted
        assert!(!clock.tick(128));
    }

    #[test]
    fn clock_keeps_threshold_after_block_size_change() {
        let mut clock = PipelineClock::with_block_size(256);
        assert_eq!(clock.emit_threshold(), 2);
        clock.tick(64);
        assert!(clock.drifted());
        assert_eq!(clock.emit_threshold(), 2);
    }

    #[test]
    fn emits_amplified_mean_after_threshold() {
        let mut acc = BlockAccumulator::new(1, 3.5, PipelineClock::with_block_size(128));
        let p = 0.2;
        let mut ready = false;
        for _ in 0..4 {
            acc.add(0, p);
            ready = acc.finish_block(128);
        }
        assert!(ready);
        let sample = acc.drain(0);
        assert!((sample - p * 3.5).abs() < 1e-5);
        assert_eq!(acc.drain(0), 0.0);
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let mut acc = BlockAccumulator::new(2, 1.0, PipelineClock::new());
        acc.add(5, 1.0);
        assert_eq!(acc.drain(5), 0.0);
    }
}
