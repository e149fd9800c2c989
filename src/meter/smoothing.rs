//! Fixed-depth moving average.

/// History of the last `depth` display samples for one channel.
///
/// Stored as a circular buffer: `head` points at the newest entry and a push
/// overwrites the oldest one. All slots start at zero, so the window always
/// holds exactly `depth` values.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    slots: Vec<f32>,
    head: usize,
}

impl SmoothingWindow {
    /// `depth` is clamped to at least one slot.
    pub fn new(depth: usize) -> Self {
        Self {
            slots: vec![0.0; depth.max(1)],
            head: 0,
        }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Shift in a new sample, discarding the oldest.
    pub fn push(&mut self, value: f32) {
        let depth = self.slots.len();
        self.head = (self.head + depth - 1) % depth;
        self.slots[self.head] = value;
    }

    /// Mean of the whole window, capped at `1.0`.
    pub fn average(&self) -> f32 {
        let sum: f32 = self.slots.iter().sum();
        (sum / self.slots.len() as f32).min(1.0)
    }

    /// Entries from newest to oldest.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (older, newer) = self.slots.split_at(self.head);
        newer.iter().chain(older.iter()).copied()
    }
}
