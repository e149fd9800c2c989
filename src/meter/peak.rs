//! Block peak extraction.

use cpal::{FromSample, Sample};

/// Largest absolute sample value in a block.
///
/// An empty block yields `0.0`. NaN samples are ignored.
pub fn peak<I>(samples: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    samples.into_iter().map(f32::abs).fold(0.0, f32::max)
}

/// Peak of one channel inside an interleaved buffer, in `f32` scale.
///
/// Reads every `channels`-th sample starting at `channel` without copying.
pub fn peak_interleaved<T>(data: &[T], channels: usize, channel: usize) -> f32
where
    T: Sample,
    f32: FromSample<T>,
{
    if channels == 0 || channel >= channels {
        return 0.0;
    }
    peak(
        data.iter()
            .skip(channel)
            .step_by(channels)
            .map(|&s| f32::from_sample(s)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_is_zero() {
        assert_eq!(peak(std::iter::empty()), 0.0);
    }

    #[test]
    fn silent_block_is_zero() {
        assert_eq!(peak([0.0f32; 64]), 0.0);
    }

    #[test]
    fn picks_largest_magnitude_exactly() {
        let block = [0.25, -0.75, 0.5, -0.1];
        assert_eq!(peak(block), 0.75);
    }

    #[test]
    fn result_covers_every_sample() {
        let block = [-0.3, 0.9, -0.95, 0.2, 0.0];
        let p = peak(block);
        assert!(p >= 0.0);
        for s in block {
            assert!(p >= s.abs());
        }
    }

    #[test]
    fn nan_does_not_poison_result() {
        assert_eq!(peak([0.4, f32::NAN, -0.2]), 0.4);
    }

    #[test]
    fn interleaved_channels_are_separated() {
        // L, R, L, R
        let data: [f32; 4] = [0.1, -0.8, -0.4, 0.2];
        assert_eq!(peak_interleaved(&data, 2, 0), 0.4);
        assert_eq!(peak_interleaved(&data, 2, 1), 0.8);
    }

    #[test]
    fn interleaved_missing_channel_is_silent() {
        let data: [f32; 2] = [0.5, 0.5];
        assert_eq!(peak_interleaved(&data, 2, 2), 0.0);
        assert_eq!(peak_interleaved(&data, 0, 0), 0.0);
    }

    #[test]
    fn integer_samples_are_normalized() {
        let data: [i16; 4] = [i16::MIN, 0, 16384, -8192];
        assert_eq!(peak_interleaved(&data, 2, 0), 1.0);
        assert_eq!(peak_interleaved(&data, 2, 1), 0.25);

        // u16 silence sits at the midpoint
        let unsigned: [u16; 2] = [32768, 32768];
        assert_eq!(peak_interleaved(&unsigned, 1, 0), 0.0);
    }
}
