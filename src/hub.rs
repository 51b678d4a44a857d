//! The event hub: subscription table, dispatcher and lifecycle.
//!
//! # Overview
//! - [`Hub::new`] builds the lock (and the queue in queued mode) from the [`Port`].
//! - [`Hub::subscribe`] / [`Hub::unsubscribe`] edit the table under the lock.
//! - [`Hub::publish`] stamps the event with the port clock, then either walks the table and
//!   invokes matching callbacks (direct mode) or enqueues a copy (queued mode).
//! - [`Hub::process`] takes one event off the queue and invokes its subscribers. In direct
//!   mode it returns at once.
//! - [`Hub::destroy`] releases the port resources and clears the table.
//!
//! # Locking
//! Table edits and table walks take the same lock, so a dispatch never sees a half-edited
//! slot. The queue synchronises itself; `process` takes the table lock only after an event
//! has been dequeued. Callbacks run with the table lock held.

use core::cell::UnsafeCell;

use crate::config::{DispatchMode, HubConfig};
use crate::error::{HubError, Resource};
use crate::event::{Event, EventType, Timeout};
use crate::port::{EventQueue, Locked, Port, RawLock};
use crate::table::{Callback, Context, SubscriptionTable};
use crate::trace::{NoTrace, Operation, TraceRecord, TraceSink};

/// Outcome of one [`Hub::process`] call.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// An event was taken off the queue.
    pub received: bool,
    /// Callbacks invoked for it.
    pub delivered: usize,
}

/// Publish/subscribe hub with storage for `SLOTS` subscribers and `WORDS * 32` event types.
///
/// `P` supplies the lock, clock and queue; `S` receives trace records when
/// [`HubConfig::enable_log`] is set.
pub struct Hub<P: Port, S: TraceSink = NoTrace, const SLOTS: usize = 8, const WORDS: usize = 1> {
    config: HubConfig,
    port: P,
    sink: S,
    lock: Option<P::Lock>,
    queue: Option<P::Queue>,
    table: UnsafeCell<SubscriptionTable<SLOTS, WORDS>>,
}

// The table is only reached through `Locked`, which holds the port lock.
unsafe impl<P, S, const SLOTS: usize, const WORDS: usize> Sync for Hub<P, S, SLOTS, WORDS>
where
    P: Port + Sync,
    P::Lock: Sync,
    P::Queue: Sync,
    S: TraceSink + Sync,
{
}

impl<P: Port, const SLOTS: usize, const WORDS: usize> Hub<P, NoTrace, SLOTS, WORDS> {
    /// Builds a hub without tracing.
    pub fn new(config: HubConfig, port: P) -> Result<Self, HubError> {
        Self::with_trace(config, port, NoTrace)
    }
}

impl<P: Port, S: TraceSink, const SLOTS: usize, const WORDS: usize> Hub<P, S, SLOTS, WORDS> {
    /// Builds a hub reporting to `sink`.
    ///
    /// The lock is created first, then the queue in queued mode. If the queue cannot be
    /// created the lock is released again before the error is returned.
    pub fn with_trace(config: HubConfig, port: P, sink: S) -> Result<Self, HubError> {
        config.validate_for::<SLOTS, WORDS>()?;

        let trace = |record: TraceRecord| {
            if config.enable_log {
                sink.record(&record);
            }
        };

        let Some(lock) = port.create_lock() else {
            trace(TraceRecord::InitFailed {
                resource: Resource::Lock,
            });
            return Err(HubError::Init(Resource::Lock));
        };

        let queue = match config.mode {
            DispatchMode::Direct => None,
            DispatchMode::Queued => match port.create_queue(config.queue_capacity) {
                Some(queue) => Some(queue),
                None => {
                    drop(lock);
                    trace(TraceRecord::InitFailed {
                        resource: Resource::Queue,
                    });
                    return Err(HubError::Init(Resource::Queue));
                }
            },
        };

        trace(TraceRecord::Initialized {
            mode: config.mode,
            strategy: config.strategy,
        });

        Ok(Self {
            table: UnsafeCell::new(SubscriptionTable::new(
                config.max_slots,
                config.max_event_types,
                config.strategy,
            )),
            config,
            port,
            sink,
            lock: Some(lock),
            queue,
        })
    }

    #[inline]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    #[inline]
    pub fn port(&self) -> &P {
        &self.port
    }

    /// True until [`destroy`](Self::destroy) is called.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.lock.is_some()
    }

    #[inline]
    fn trace(&self, record: TraceRecord) {
        if self.config.enable_log {
            self.sink.record(&record);
        }
    }

    #[inline]
    fn rejected(&self, op: Operation, kind: Option<EventType>, error: HubError) -> HubError {
        self.trace(TraceRecord::Rejected { op, kind, error });
        error
    }

    fn lock_table(
        &self,
        timeout: Timeout,
    ) -> Result<Locked<'_, P::Lock, SubscriptionTable<SLOTS, WORDS>>, HubError> {
        let lock = self.lock.as_ref().ok_or(HubError::Destroyed)?;
        if !lock.acquire(timeout) {
            return Err(HubError::LockTimeout);
        }
        // SAFETY: the lock was just acquired and guards every access to the table
        // made through a shared reference to the hub.
        Ok(unsafe { Locked::new(lock, &mut *self.table.get()) })
    }

    /// Registers `callback` with `context` for events of type `kind`.
    ///
    /// Fails with [`HubError::InvalidArgument`] for an out-of-range type,
    /// [`HubError::ResourceExhausted`] when no slot is free, [`HubError::AlreadyBound`]
    /// when a single-type identity already watches another type, and
    /// [`HubError::LockTimeout`] when the lock is busy for the configured lock timeout.
    pub fn subscribe(
        &self,
        kind: EventType,
        callback: Callback,
        context: Context,
    ) -> Result<(), HubError> {
        let outcome = self
            .lock_table(self.config.lock_timeout)
            .and_then(|mut table| table.subscribe(kind, callback, context));
        match outcome {
            Ok(sub) => {
                self.trace(TraceRecord::Subscribed {
                    kind,
                    slot: sub.slot,
                    new_identity: sub.new_identity,
                });
                Ok(())
            }
            Err(err) => Err(self.rejected(Operation::Subscribe, Some(kind), err)),
        }
    }

    /// Removes `kind` from the subscription held by `callback`, whatever its context.
    /// The slot is freed once it watches nothing.
    pub fn unsubscribe(&self, kind: EventType, callback: Callback) -> Result<(), HubError> {
        let outcome = self
            .lock_table(self.config.lock_timeout)
            .and_then(|mut table| table.unsubscribe(kind, callback));
        match outcome {
            Ok(out) => {
                self.trace(TraceRecord::Unsubscribed {
                    kind,
                    slot: out.slot,
                    released: out.released,
                });
                Ok(())
            }
            Err(err) => Err(self.rejected(Operation::Unsubscribe, Some(kind), err)),
        }
    }

    /// Publishes `event`, overwriting its timestamp with the port clock.
    ///
    /// Direct mode: takes the table lock (waiting at most `timeout`) and invokes every
    /// matching callback before returning.
    ///
    /// Queued mode: enqueues a copy, waiting at most `timeout` for room. When the queue
    /// stays full the event is dropped and [`HubError::QueueFull`] is returned.
    pub fn publish(&self, mut event: Event, timeout: Timeout) -> Result<(), HubError> {
        let kind = event.kind;
        if !self.is_ready() {
            return Err(self.rejected(Operation::Publish, Some(kind), HubError::Destroyed));
        }
        if kind.get() >= self.config.max_event_types {
            return Err(self.rejected(
                Operation::Publish,
                Some(kind),
                HubError::InvalidArgument,
            ));
        }
        event.timestamp = self.port.now_ms();

        match self.config.mode {
            DispatchMode::Direct => {
                let table = self
                    .lock_table(timeout)
                    .map_err(|err| self.rejected(Operation::Publish, Some(kind), err))?;
                let delivered = dispatch(&*table, &event);
                drop(table);
                self.trace(TraceRecord::Published {
                    kind,
                    mode: DispatchMode::Direct,
                });
                self.trace(TraceRecord::Dispatched { kind, delivered });
                Ok(())
            }
            DispatchMode::Queued => {
                let queue = self.queue.as_ref().ok_or(HubError::Destroyed)?;
                if queue.send(event, timeout).is_err() {
                    return Err(self.rejected(Operation::Publish, Some(kind), HubError::QueueFull));
                }
                self.trace(TraceRecord::Published {
                    kind,
                    mode: DispatchMode::Queued,
                });
                Ok(())
            }
        }
    }

    /// Waits at most `timeout` for one queued event and invokes its subscribers.
    ///
    /// Returns at once in direct mode. If the table lock cannot be taken within the
    /// configured lock timeout, the dequeued event is dropped and
    /// [`HubError::LockTimeout`] is returned.
    pub fn process(&self, timeout: Timeout) -> Result<ProcessStats, HubError> {
        if !self.is_ready() {
            return Err(self.rejected(Operation::Process, None, HubError::Destroyed));
        }
        let Some(queue) = self.queue.as_ref() else {
            return Ok(ProcessStats::default());
        };
        let Some(event) = queue.receive(timeout) else {
            return Ok(ProcessStats::default());
        };
        let kind = event.kind;
        self.trace(TraceRecord::Received { kind });

        let table = self
            .lock_table(self.config.lock_timeout)
            .map_err(|err| self.rejected(Operation::Process, Some(kind), err))?;
        let delivered = dispatch(&*table, &event);
        drop(table);
        self.trace(TraceRecord::Dispatched { kind, delivered });

        Ok(ProcessStats {
            received: true,
            delivered,
        })
    }

    /// Copy of the subscription table, taken under the lock.
    pub fn snapshot(&self) -> Result<SubscriptionTable<SLOTS, WORDS>, HubError> {
        let table = self.lock_table(self.config.lock_timeout)?;
        Ok(*table)
    }

    /// Number of subscription slots in use.
    pub fn subscriber_count(&self) -> Result<usize, HubError> {
        let table = self.lock_table(self.config.lock_timeout)?;
        Ok(table.len())
    }

    /// Releases the lock and queue and clears the table. Later operations fail with
    /// [`HubError::Destroyed`]. Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.lock.is_none() {
            return;
        }
        self.queue = None;
        self.lock = None;
        self.table.get_mut().clear();
        self.trace(TraceRecord::Destroyed);
    }
}

fn dispatch<const SLOTS: usize, const WORDS: usize>(
    table: &SubscriptionTable<SLOTS, WORDS>,
    event: &Event,
) -> usize {
    let mut delivered = 0;
    for (callback, context) in table.matching(event.kind) {
        callback(event, context);
        delivered += 1;
    }
    delivered
}
