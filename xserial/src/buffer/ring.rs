//! Lock-free single-producer/single-consumer byte ring buffer.
//!
//! One side only ever calls [`RingBuffer::push`], the other only ever calls
//! [`RingBuffer::pop`]. Each side owns one counter and only reads the other,
//! so the two sides can run in different execution contexts (an interrupt
//! handler and the main loop, or two threads) sharing the buffer by `&`.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// A fixed-capacity circular byte buffer.
///
/// `write_index` and `read_index` increase monotonically and are never
/// wrapped explicitly. A slot is addressed by masking a counter with
/// `N - 1`, and occupancy is `write_index - read_index` in wrapping
/// arithmetic. Because `N` is a power of two it divides the counter range,
/// so both stay correct after the counters overflow.
#[derive(Debug)]
pub struct RingBuffer<const N: usize> {
    /// The underlying storage.
    storage: [AtomicU8; N],

    /// Total number of bytes ever pushed. Owned by the producer.
    write_index: AtomicUsize,

    /// Total number of bytes ever popped. Owned by the consumer.
    read_index: AtomicUsize,
}

impl<const N: usize> RingBuffer<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "ring buffer capacity must be a power of two");
        N - 1
    };

    /// Creates a new empty ring buffer.
    pub const fn new() -> Self {
        let _mask = Self::MASK;
        Self {
            storage: [const { AtomicU8::new(0) }; N],
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    /// Creates an empty buffer whose counters both start at `index`.
    #[cfg(test)]
    pub(crate) const fn starting_at(index: usize) -> Self {
        let _mask = Self::MASK;
        Self {
            storage: [const { AtomicU8::new(0) }; N],
            write_index: AtomicUsize::new(index),
            read_index: AtomicUsize::new(index),
        }
    }

    /// Returns the buffer capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of bytes in the buffer.
    ///
    /// Exact when called from the producer or the consumer side. Any other
    /// observer gets a snapshot that may already be stale.
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Appends one byte. Producer side only.
    ///
    /// Returns `false` and leaves the buffer untouched when it is full.
    pub fn push(&self, byte: u8) -> bool {
        let write = self.write_index.load(Ordering::Relaxed);
        // Acquire pairs with the consumer's release: its read of the slot we
        // are about to reuse is complete.
        let read = self.read_index.load(Ordering::Acquire);
        if write.wrapping_sub(read) >= N {
            return false;
        }

        self.storage[write & Self::MASK].store(byte, Ordering::Relaxed);
        // Publish last, so the slot is visible before the new count.
        self.write_index.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Removes the oldest byte. Consumer side only.
    pub fn pop(&self) -> Option<u8> {
        let read = self.read_index.load(Ordering::Relaxed);
        let write = self.write_index.load(Ordering::Acquire);
        if write == read {
            return None;
        }

        let byte = self.storage[read & Self::MASK].load(Ordering::Relaxed);
        // Hands the slot back to the producer.
        self.read_index.store(read.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Resets both counters, discarding any buffered bytes.
    ///
    /// Only sound while neither side is running.
    pub fn clear(&self) {
        self.read_index.store(0, Ordering::Release);
        self.write_index.store(0, Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
