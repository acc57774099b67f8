//! Fixed-capacity scrolling window of samples for one signal.
//!
//! The buffer always holds exactly `capacity` values. It starts zero-filled and every
//! [`RingBuffer::advance`] drops the oldest value and appends one new value, so plotted
//! series scroll from right to left at one slot per ingested batch.
//!
//! Internally this is a circular array with a moving head; readers only ever see the
//! logical oldest→newest order.

use std::num::NonZeroUsize;

/// Scrolling sample window with a length fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer {
    values: Box<[f64]>,
    /// Index of the oldest value; the newest value sits just before it.
    head: usize,
}

impl RingBuffer {
    /// Creates a buffer of `capacity` zeros.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            values: vec![0.0; capacity.get()].into_boxed_slice(),
            head: 0,
        }
    }

    /// Number of slots. Never changes after construction.
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Always equal to [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A ring buffer is never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Scrolls the window by one slot.
    ///
    /// The oldest value is discarded and `value` becomes the newest one. `None` writes
    /// `0.0`, which is how signals without a sample in a batch flat-line.
    pub fn advance(&mut self, value: Option<f64>) {
        self.values[self.head] = value.unwrap_or(0.0);
        self.head = (self.head + 1) % self.values.len();
    }

    /// Most recently written value.
    pub fn tail(&self) -> f64 {
        let newest = (self.head + self.values.len() - 1) % self.values.len();
        self.values[newest]
    }

    /// Iterates the window oldest→newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.values.split_at(self.head);
        older.iter().chain(newer).copied()
    }

    /// Copies the window oldest→newest.
    pub fn snapshot(&self) -> Vec<f64> {
        let (newer, older) = self.values.split_at(self.head);
        let mut out = Vec::with_capacity(self.values.len());
        out.extend_from_slice(older);
        out.extend_from_slice(newer);
        out
    }
}
