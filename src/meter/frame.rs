//! Latest-value handoff from the audio callback to the render thread.
//!
//! The callback must never block or allocate, so levels are stored as `f32`
//! bits in pre-allocated atomics behind a sequence counter. The writer
//! overwrites whatever frame is there; the reader copies the newest one and
//! retries a bounded number of times if it raced a write.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

const SNAPSHOT_RETRIES: usize = 4;

pub struct FrameSlot {
    levels: Box<[AtomicU32]>,
    /// Odd while a write is in progress; `0` until the first publish.
    sequence: AtomicU64,
    block_size_changed: AtomicBool,
}

impl FrameSlot {
    pub fn new(channels: usize) -> Self {
        Self {
            levels: (0..channels).map(|_| AtomicU32::new(0)).collect(),
            sequence: AtomicU64::new(0),
            block_size_changed: AtomicBool::new(false),
        }
    }

    pub fn channels(&self) -> usize {
        self.levels.len()
    }

    /// Single writer only: the audio callback.
    pub fn publish(&self, levels: &[f32]) {
        let seq = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(seq.wrapping_add(1), Ordering::Relaxed);
        std::sync::atomic::fence(Ordering::Release);

        for (slot, level) in self.levels.iter().zip(levels) {
            slot.store(level.to_bits(), Ordering::Relaxed);
        }

        self.sequence.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Copy the newest frame into `out` and return its sequence number.
    ///
    /// `None` if nothing was published yet or every retry raced a write.
    pub fn snapshot(&self, out: &mut [f32]) -> Option<u64> {
        for _ in 0..SNAPSHOT_RETRIES {
            let before = self.sequence.load(Ordering::Acquire);
            if before == 0 {
                return None;
            }
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }

            for (dst, slot) in out.iter_mut().zip(self.levels.iter()) {
                *dst = f32::from_bits(slot.load(Ordering::Relaxed));
            }

            std::sync::atomic::fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                return Some(before);
            }
        }
        None
    }

    pub fn flag_block_size_change(&self) {
        self.block_size_changed.store(true, Ordering::Relaxed);
    }

    /// Returns the flag and clears it, so each change is reported once.
    pub fn take_block_size_change(&self) -> bool {
        self.block_size_changed.swap(false, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_slot_has_no_frame() {
        let slot = FrameSlot::new(2);
        let mut out = [0.0; 2];
        assert_eq!(slot.snapshot(&mut out), None);
    }

    #[test]
    fn newest_frame_wins() {
        let slot = FrameSlot::new(2);
        slot.publish(&[0.1, 0.2]);
        slot.publish(&[0.9, 0.4]);

        let mut out = [0.0; 2];
        let seq = slot.snapshot(&mut out).unwrap();
        assert_eq!(out, [0.9, 0.4]);
        assert_eq!(seq, 4);
    }

    #[test]
    fn sequence_advances_per_publish() {
        let slot = FrameSlot::new(1);
        let mut out = [0.0; 1];
        slot.publish(&[0.5]);
        let first = slot.snapshot(&mut out).unwrap();
        slot.publish(&[0.5]);
        let second = slot.snapshot(&mut out).unwrap();
        assert!(second > first);
    }

    #[test]
    fn block_size_change_reported_once() {
        let slot = FrameSlot::new(1);
        assert!(!slot.take_block_size_change());
        slot.flag_block_size_change();
        assert!(slot.take_block_size_change());
        assert!(!slot.take_block_size_change());
    }

    #[test]
    fn reader_never_sees_mixed_frames() {
        let slot = Arc::new(FrameSlot::new(4));
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..20_000u32 {
                    let v = (i % 100) as f32 / 100.0;
                    slot.publish(&[v; 4]);
                }
            })
        };

        let mut out = [0.0; 4];
        for _ in 0..20_000 {
            if slot.snapshot(&mut out).is_some() {
                assert!(out.iter().all(|&v| v == out[0]), "torn frame {:?}", out);
            }
        }
        writer.join().unwrap();
    }
}
