//! Lock-free bounded FIFO for handing events between execution contexts in no-std targets.
//!
//! # Overview
//! - Any number of producers and consumers; every item is taken by exactly one consumer.
//! - Never overwrites: `push` hands the value back when the ring is full.
//! - Neither side blocks; callers that want to wait poll with their own clock.
//! - `N` is the storage size (a power of two); a smaller runtime limit may be set at construction.
//!
//! # Memory ordering
//! Every slot carries a sequence number. A producer claims position `p` by advancing `tail`
//! only when the slot's sequence equals `p`, writes the value, then publishes `p + 1`.
//! A consumer claims position `p` when the sequence equals `p + 1`, reads the value, then
//! releases the slot for the next lap by storing `p + N`. A slot is therefore never read
//! while being written, or written while being read.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

use crate::atomic::{AtomicUsize, Ordering};

fn sequence_array<const N: usize>() -> [AtomicUsize; N] {
    core::array::from_fn(AtomicUsize::new)
}

fn unsafe_cell_array<T, const N: usize>() -> [UnsafeCell<MaybeUninit<T>>; N] {
    core::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit()))
}

/// Bounded multi-producer multi-consumer FIFO with inline storage for `N` items.
pub struct EventRing<T, const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    limit: usize,
    slot_seq: [AtomicUsize; N],
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

unsafe impl<T: Send, const N: usize> Sync for EventRing<T, N> {}

impl<T, const N: usize> Default for EventRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> EventRing<T, N> {
    /// Ring holding up to `N` items.
    pub fn new() -> Self {
        Self::with_limit(N)
    }

    /// Ring holding up to `limit` items, `1 <= limit <= N`.
    pub fn with_limit(limit: usize) -> Self {
        assert!(N > 0 && N.is_power_of_two());
        assert!(limit > 0 && limit <= N);
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            limit,
            slot_seq: sequence_array::<N>(),
            slots: unsafe_cell_array::<T, N>(),
        }
    }

    #[inline(always)]
    const fn idx_for(pos: usize) -> usize {
        pos & (N - 1)
    }

    /// Maximum number of items held at once.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Items currently queued. Only a hint while other contexts are pushing or popping.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head).min(self.limit)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `value`. Returns it back if the ring is full.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let idx = Self::idx_for(pos);
            let seq = self.slot_seq[idx].load(Ordering::Acquire);
            let lag = seq.wrapping_sub(pos) as isize;

            if lag == 0 {
                // head only moves forward, so a stale read overstates the fill level
                let used = pos.wrapping_sub(self.head.load(Ordering::Acquire));
                if used > N {
                    pos = self.tail.load(Ordering::Relaxed);
                    continue;
                }
                if used >= self.limit {
                    return Err(value);
                }
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*self.slots[idx].get()).as_mut_ptr().write(value) };
                        self.slot_seq[idx].store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                return Err(value);
            } else {
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Removes the oldest item.
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let idx = Self::idx_for(pos);
            let seq = self.slot_seq[idx].load(Ordering::Acquire);
            let lag = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if lag == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*self.slots[idx].get()).assume_init_read() };
                        self.slot_seq[idx].store(pos.wrapping_add(N), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                return None;
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }
}

impl<T, const N: usize> Drop for EventRing<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
