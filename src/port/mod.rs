//! Host primitives the hub depends on.
//!
//! A [`Port`] supplies a lock with timeout, a millisecond clock and, for queued
//! dispatch, a bounded FIFO of [`Event`]s. Two adapters ship with the crate:
//!
//! - [`baremetal`]: single thread of control plus interrupts. The lock never waits;
//!   the clock is a tick counter driven from a timer interrupt.
//! - [`hosted`] (feature `std`): blocking lock and queue on OS threads, standing in
//!   for an RTOS's native mutex and queue.
//!
//! Only [`RawLock::acquire`], [`EventQueue::send`] and [`EventQueue::receive`] may block,
//! and never beyond the timeout they are given.

use core::ops::{Deref, DerefMut};

use crate::event::{Event, Timeout, Timestamp};

pub mod baremetal;
#[cfg(feature = "std")]
pub mod hosted;

/// Mutual exclusion with a bounded wait.
///
/// # Safety
/// While one `acquire` has returned true and the matching `release` has not been
/// called, no other `acquire` on the same lock may return true.
pub unsafe trait RawLock {
    /// Takes the lock, waiting at most `timeout`. Returns false if it was not taken.
    fn acquire(&self, timeout: Timeout) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    /// The caller must hold the lock through a successful [`acquire`](Self::acquire).
    unsafe fn release(&self);
}

/// Bounded FIFO of events.
pub trait EventQueue {
    /// Enqueues `event`, waiting at most `timeout` for room. Hands the event back on timeout.
    fn send(&self, event: Event, timeout: Timeout) -> Result<(), Event>;

    /// Dequeues the oldest event, waiting at most `timeout` for one to arrive.
    fn receive(&self, timeout: Timeout) -> Option<Event>;
}

/// Monotonic millisecond clock. Wraps at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

/// Factory for the primitives a hub owns.
pub trait Port: Clock {
    type Lock: RawLock;
    type Queue: EventQueue;

    /// Builds the table lock. `None` when the host cannot provide one.
    fn create_lock(&self) -> Option<Self::Lock>;

    /// Builds a queue holding up to `capacity` events. `None` when the port has no
    /// queue or cannot hold that many.
    fn create_queue(&self, capacity: usize) -> Option<Self::Queue>;
}

/// Exclusive access to `T` while `lock` is held. Releases on drop.
pub(crate) struct Locked<'a, L: RawLock, T> {
    lock: &'a L,
    value: &'a mut T,
}

impl<'a, L: RawLock, T> Locked<'a, L, T> {
    /// # Safety
    /// `lock` must have just been acquired, and it must be the lock that guards every
    /// other access to `value`.
    pub(crate) unsafe fn new(lock: &'a L, value: &'a mut T) -> Self {
        Self { lock, value }
    }
}

impl<L: RawLock, T> Deref for Locked<'_, L, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value
    }
}

impl<L: RawLock, T> DerefMut for Locked<'_, L, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value
    }
}

impl<L: RawLock, T> Drop for Locked<'_, L, T> {
    fn drop(&mut self) {
        unsafe { self.lock.release() };
    }
}
