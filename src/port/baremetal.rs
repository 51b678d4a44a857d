//! Port for a single thread of control plus interrupt handlers.
//!
//! - The lock is a busy flag. With one thread it is always free, so `acquire` succeeds
//!   at once; if it is already held (a callback calling back into the hub, or an
//!   interrupt preempting a table walk) `acquire` fails at once instead of waiting.
//!   Timeouts are ignored.
//! - The clock is a [`TickCounter`] advanced from a 1 ms timer interrupt.
//! - `Q = 0` (the default) has no queue: only direct dispatch is available. With
//!   `Q` a power of two the port hands out an [`EventRing`]-backed queue so
//!   interrupt handlers can publish and the main loop can `process`. Queue operations
//!   never wait.
//!
//! ```
//! use ph_eventhub::{BareMetalPort, TickCounter};
//!
//! static TICKS: TickCounter = TickCounter::new();
//!
//! // fn SysTick() { TICKS.tick(); }
//! let port = BareMetalPort::with_clock(&TICKS);
//! # let _ = port;
//! ```

use crate::atomic::{AtomicBool, AtomicU32, Ordering};
use crate::event::{Event, Timeout, Timestamp};
use crate::port::{Clock, EventQueue, Port, RawLock};
use crate::ring::EventRing;

/// Non-waiting lock flag.
#[derive(Debug, Default)]
pub struct FlagLock {
    held: AtomicBool,
}

impl FlagLock {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

unsafe impl RawLock for FlagLock {
    #[inline]
    fn acquire(&self, _timeout: Timeout) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Millisecond counter advanced by a timer interrupt.
#[derive(Debug, Default)]
pub struct TickCounter {
    ms: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            ms: AtomicU32::new(0),
        }
    }

    /// Advances the counter by one millisecond. Call from the 1 ms timer interrupt.
    #[inline]
    pub fn tick(&self) {
        self.ms.fetch_add(1, Ordering::Relaxed);
    }

    /// Advances the counter by `ms` milliseconds.
    #[inline]
    pub fn advance(&self, ms: u32) {
        self.ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for TickCounter {
    #[inline]
    fn now_ms(&self) -> Timestamp {
        Timestamp::from_millis(self.ms.load(Ordering::Relaxed))
    }
}

/// Non-waiting event queue over an [`EventRing`].
pub struct RingQueue<const Q: usize> {
    ring: EventRing<Event, Q>,
}

impl<const Q: usize> RingQueue<Q> {
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const Q: usize> EventQueue for RingQueue<Q> {
    #[inline]
    fn send(&self, event: Event, _timeout: Timeout) -> Result<(), Event> {
        self.ring.push(event)
    }

    #[inline]
    fn receive(&self, _timeout: Timeout) -> Option<Event> {
        self.ring.pop()
    }
}

/// Port for bare-metal main loops. See the [module docs](self).
#[derive(Debug, Default)]
pub struct BareMetalPort<C = TickCounter, const Q: usize = 0> {
    clock: C,
}

impl BareMetalPort {
    /// Port with its own tick counter and no queue.
    pub const fn new() -> Self {
        Self {
            clock: TickCounter::new(),
        }
    }
}

impl<C: Clock> BareMetalPort<C> {
    /// Port without a queue, reading time from `clock`.
    pub const fn with_clock(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock, const Q: usize> BareMetalPort<C, Q> {
    /// Port with a queue of up to `Q` events, reading time from `clock`.
    pub const fn queued(clock: C) -> Self {
        Self { clock }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock, const Q: usize> Clock for BareMetalPort<C, Q> {
    #[inline]
    fn now_ms(&self) -> Timestamp {
        self.clock.now_ms()
    }
}

impl<C: Clock, const Q: usize> Port for BareMetalPort<C, Q> {
    type Lock = FlagLock;
    type Queue = RingQueue<Q>;

    fn create_lock(&self) -> Option<FlagLock> {
        Some(FlagLock::new())
    }

    fn create_queue(&self, capacity: usize) -> Option<RingQueue<Q>> {
        if !Q.is_power_of_two() || capacity == 0 || capacity > Q {
            return None;
        }
        Some(RingQueue {
            ring: EventRing::with_limit(capacity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;

    #[test]
    fn flag_lock_refuses_second_holder() {
        let lock = FlagLock::new();
        assert!(lock.acquire(Timeout::NONE));
        assert!(lock.is_held());
        assert!(!lock.acquire(Timeout::FOREVER));
        unsafe { lock.release() };
        assert!(lock.acquire(Timeout::NONE));
    }

    #[test]
    fn tick_counter_wraps() {
        let ticks = TickCounter::new();
        ticks.advance(u32::MAX);
        assert_eq!(ticks.now_ms().as_millis(), u32::MAX);
        ticks.tick();
        assert_eq!(ticks.now_ms().as_millis(), 0);
    }

    #[test]
    fn plain_port_has_no_queue() {
        let port = BareMetalPort::new();
        assert!(port.create_lock().is_some());
        assert!(port.create_queue(1).is_none());
    }

    #[test]
    fn queue_storage_must_be_power_of_two() {
        let port: BareMetalPort<TickCounter, 6> = BareMetalPort::queued(TickCounter::new());
        assert!(port.create_queue(4).is_none());
    }

    #[test]
    fn queued_port_bounds_queue_by_storage() {
        let port: BareMetalPort<TickCounter, 8> = BareMetalPort::queued(TickCounter::new());
        assert!(port.create_queue(0).is_none());
        assert!(port.create_queue(9).is_none());

        let queue = port.create_queue(2).unwrap();
        let ev = Event::new(EventType::new(1));
        assert!(queue.send(ev.clone(), Timeout::FOREVER).is_ok());
        assert!(queue.send(ev.clone(), Timeout::FOREVER).is_ok());
        assert_eq!(queue.send(ev.clone(), Timeout::FOREVER), Err(ev.clone()));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.receive(Timeout::NONE), Some(ev));
    }

    #[test]
    fn port_reads_shared_clock() {
        static TICKS: TickCounter = TickCounter::new();
        let port = BareMetalPort::with_clock(&TICKS);
        let before = port.now_ms();
        TICKS.advance(5);
        assert!(port.now_ms().wrapping_since(before) >= 5);
    }
}
