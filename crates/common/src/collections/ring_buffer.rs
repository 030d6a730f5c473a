#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

//! Fixed-capacity history buffer that drops its oldest element on overflow.
//!
//! [`RingBuffer`] backs the per-operation metric history of the performance
//! monitor: samples are appended in arrival order and, once the buffer is
//! full, every push discards the oldest sample. [`push`](RingBuffer::push)
//! hands the discarded element back so callers can account for dropped data.
//!
//! # Complexity
//! - `push`, `pop_oldest`, `get`, `len`, `is_full` are **O(1)**.
//! - `retain` is **O(n)**.

use std::collections::VecDeque;

/// A bounded FIFO history.
///
/// # Examples
///
/// ```rust
/// use mishkat_common::collections::RingBuffer;
///
/// let mut history = RingBuffer::new(3);
/// history.push(1);
/// history.push(2);
/// history.push(3);
/// assert_eq!(history.push(4), Some(1));
///
/// assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a new buffer with the provided capacity.
    ///
    /// A capacity of zero is clamped to `1`.
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: VecDeque::with_capacity(capacity.min(1024)), capacity }
    }

    /// Appends an item, returning the oldest item if it had to be dropped.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() { self.buf.pop_front() } else { None };
        self.buf.push_back(item);
        evicted
    }

    /// Removes and returns the oldest item.
    #[inline]
    pub fn pop_oldest(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    /// Returns the item at `idx`, counting from the oldest.
    #[inline]
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.buf.get(idx)
    }

    /// Returns the most recently pushed item.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Number of stored items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// `true` once the next push will evict.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    /// Maximum number of retained items.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every item, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Keeps only the items matching `keep`, preserving order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.buf.retain(keep);
    }

    /// Iterates from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            let _ = self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for collections::ring_buffer.
    use super::RingBuffer;

    /// Validates that pushing past capacity drops and returns the oldest
    /// item.
    #[test]
    fn test_push_past_capacity_returns_evicted() {
        let mut buffer = RingBuffer::new(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.push(5), Some(2));

        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(buffer.latest(), Some(&5));
        assert_eq!(buffer.get(0), Some(&3));
    }

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        let mut buffer = RingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.push('a');
        assert_eq!(buffer.push('b'), Some('a'));
        assert_eq!(buffer.len(), 1);
        assert!(buffer.is_full());
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut buffer = RingBuffer::new(10);
        buffer.extend(0..10);
        buffer.retain(|v| v % 3 == 0);

        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![0, 3, 6, 9]);
        assert!(!buffer.is_full());
    }

    #[test]
    fn test_clear_then_pop_oldest() {
        let mut buffer = RingBuffer::new(2);
        buffer.extend([10, 20]);
        assert_eq!(buffer.pop_oldest(), Some(10));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.pop_oldest(), None);
    }
}
