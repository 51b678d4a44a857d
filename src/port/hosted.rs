//! Port for preemptive threads on a hosted OS.
//!
//! Stands in for an RTOS port: the lock blocks up to its timeout, the queue blocks
//! producers while full and consumers while empty, and the clock counts milliseconds
//! since the port was created. Timeout ticks are milliseconds.
//!
//! Queue storage is allocated once, when the hub creates the queue.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::lock_api::{RawMutex as _, RawMutexTimed as _};
use parking_lot::{Condvar, Mutex};

use crate::event::{Event, Timeout, Timestamp};
use crate::port::{Clock, EventQueue, Port, RawLock};

#[inline]
fn duration(timeout: Timeout) -> Duration {
    Duration::from_millis(u64::from(timeout.ticks()))
}

/// Blocking lock over [`parking_lot::RawMutex`].
pub struct HostedLock {
    raw: parking_lot::RawMutex,
}

impl HostedLock {
    pub const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
        }
    }
}

impl Default for HostedLock {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl RawLock for HostedLock {
    fn acquire(&self, timeout: Timeout) -> bool {
        if timeout.is_forever() {
            self.raw.lock();
            true
        } else if timeout.is_none() {
            self.raw.try_lock()
        } else {
            self.raw.try_lock_for(duration(timeout))
        }
    }

    unsafe fn release(&self) {
        unsafe { self.raw.unlock() };
    }
}

/// Bounded blocking FIFO.
pub struct HostedQueue {
    items: Mutex<VecDeque<Event>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl HostedQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl EventQueue for HostedQueue {
    fn send(&self, event: Event, timeout: Timeout) -> Result<(), Event> {
        let deadline = Instant::now() + duration(timeout);
        let mut items = self.items.lock();
        while items.len() >= self.capacity {
            if timeout.is_none() {
                return Err(event);
            }
            if timeout.is_forever() {
                self.not_full.wait(&mut items);
            } else if self.not_full.wait_until(&mut items, deadline).timed_out()
                && items.len() >= self.capacity
            {
                return Err(event);
            }
        }
        items.push_back(event);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    fn receive(&self, timeout: Timeout) -> Option<Event> {
        let deadline = Instant::now() + duration(timeout);
        let mut items = self.items.lock();
        loop {
            if let Some(event) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return Some(event);
            }
            if timeout.is_none() {
                return None;
            }
            if timeout.is_forever() {
                self.not_empty.wait(&mut items);
            } else if self.not_empty.wait_until(&mut items, deadline).timed_out()
                && items.is_empty()
            {
                return None;
            }
        }
    }
}

/// Port over OS threads. See the [module docs](self).
#[derive(Debug, Clone, Copy)]
pub struct HostedPort {
    epoch: Instant,
}

impl HostedPort {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for HostedPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostedPort {
    fn now_ms(&self) -> Timestamp {
        // truncation wraps the counter like a 32-bit tick register
        Timestamp::from_millis(self.epoch.elapsed().as_millis() as u32)
    }
}

impl Port for HostedPort {
    type Lock = HostedLock;
    type Queue = HostedQueue;

    fn create_lock(&self) -> Option<HostedLock> {
        Some(HostedLock::new())
    }

    fn create_queue(&self, capacity: usize) -> Option<HostedQueue> {
        if capacity == 0 {
            return None;
        }
        Some(HostedQueue::with_capacity(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use std::sync::Arc;
    use std::thread;

    fn ev(raw: u32) -> Event {
        Event::new(EventType::new(raw))
    }

    #[test]
    fn lock_times_out_while_held_elsewhere() {
        let lock = Arc::new(HostedLock::new());
        assert!(lock.acquire(Timeout::NONE));

        let other = Arc::clone(&lock);
        let started = Instant::now();
        let got = thread::spawn(move || other.acquire(Timeout::from_millis(30)))
            .join()
            .unwrap();
        assert!(!got);
        assert!(started.elapsed() >= Duration::from_millis(30));

        unsafe { lock.release() };
        assert!(lock.acquire(Timeout::from_millis(30)));
        unsafe { lock.release() };
    }

    #[test]
    fn full_queue_times_out() {
        let queue = HostedQueue::with_capacity(1);
        queue.send(ev(1), Timeout::NONE).unwrap();
        assert_eq!(queue.send(ev(2), Timeout::NONE), Err(ev(2)));

        let started = Instant::now();
        assert_eq!(queue.send(ev(3), Timeout::from_millis(20)), Err(ev(3)));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn empty_queue_times_out() {
        let queue = HostedQueue::with_capacity(4);
        assert!(queue.receive(Timeout::NONE).is_none());
        assert!(queue.receive(Timeout::from_millis(10)).is_none());
    }

    #[test]
    fn blocked_receiver_wakes_on_send() {
        let queue = Arc::new(HostedQueue::with_capacity(2));
        let rx = Arc::clone(&queue);
        let consumer = thread::spawn(move || rx.receive(Timeout::FOREVER));
        thread::sleep(Duration::from_millis(10));
        queue.send(ev(7), Timeout::NONE).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(ev(7)));
    }

    #[test]
    fn blocked_sender_wakes_on_receive() {
        let queue = Arc::new(HostedQueue::with_capacity(1));
        queue.send(ev(1), Timeout::NONE).unwrap();
        let tx = Arc::clone(&queue);
        let producer = thread::spawn(move || tx.send(ev(2), Timeout::from_millis(2_000)));
        thread::sleep(Duration::from_millis(10));
        assert_eq!(queue.receive(Timeout::NONE), Some(ev(1)));
        assert!(producer.join().unwrap().is_ok());
        assert_eq!(queue.receive(Timeout::NONE), Some(ev(2)));
    }

    #[test]
    fn clock_is_monotonic() {
        let port = HostedPort::new();
        let a = port.now_ms();
        thread::sleep(Duration::from_millis(5));
        let b = port.now_ms();
        assert!(b.wrapping_since(a) >= 5);
    }

    #[test]
    fn zero_capacity_queue_is_refused() {
        assert!(HostedPort::new().create_queue(0).is_none());
        assert_eq!(HostedPort::new().create_queue(3).unwrap().capacity(), 3);
    }
}
