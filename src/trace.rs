//! Diagnostic trace records.
//!
//! When [`HubConfig::enable_log`](crate::HubConfig::enable_log) is set, the hub reports
//! lifecycle steps, subscriptions, publishes, dispatches and failures to a [`TraceSink`].
//! Sinks only observe: nothing they do changes the outcome of the operation being traced.
//!
//! Bundled sinks:
//! - [`NoTrace`] discards everything (the default).
//! - [`TracingSink`] (feature `tracing`) forwards records to `tracing`.
//! - any `Fn(&TraceRecord)` closure.

use crate::config::{DispatchMode, SubscriptionStrategy};
use crate::error::{HubError, Resource};
use crate::event::EventType;

/// Operation named in a [`TraceRecord::Rejected`] record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Subscribe,
    Unsubscribe,
    Publish,
    Process,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Subscribe => "subscribe",
            Operation::Unsubscribe => "unsubscribe",
            Operation::Publish => "publish",
            Operation::Process => "process",
        }
    }
}

/// One traced step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceRecord {
    Initialized {
        mode: DispatchMode,
        strategy: SubscriptionStrategy,
    },
    InitFailed {
        resource: Resource,
    },
    Subscribed {
        kind: EventType,
        slot: usize,
        new_identity: bool,
    },
    Unsubscribed {
        kind: EventType,
        slot: usize,
        released: bool,
    },
    /// Accepted by `publish`: dispatched already in direct mode, enqueued in queued mode.
    Published {
        kind: EventType,
        mode: DispatchMode,
    },
    /// Taken off the queue by `process`.
    Received {
        kind: EventType,
    },
    Dispatched {
        kind: EventType,
        delivered: usize,
    },
    Rejected {
        op: Operation,
        kind: Option<EventType>,
        error: HubError,
    },
    Destroyed,
}

/// Receiver of trace records.
pub trait TraceSink {
    fn record(&self, record: &TraceRecord);
}

/// Sink that discards every record.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    #[inline(always)]
    fn record(&self, _record: &TraceRecord) {}
}

impl<F: Fn(&TraceRecord)> TraceSink for F {
    #[inline]
    fn record(&self, record: &TraceRecord) {
        self(record)
    }
}

/// Sink forwarding records to `tracing`: failures at `warn`, lifecycle at `info`,
/// traffic at `debug`.
#[cfg(feature = "tracing")]
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl TraceSink for TracingSink {
    fn record(&self, record: &TraceRecord) {
        use tracing::{debug, info, warn};

        match *record {
            TraceRecord::Initialized { mode, strategy } => {
                info!(?mode, ?strategy, "eventhub initialized");
            }
            TraceRecord::InitFailed { resource } => {
                warn!(%resource, "eventhub init failed");
            }
            TraceRecord::Subscribed {
                kind,
                slot,
                new_identity,
            } => {
                debug!(kind = kind.get(), slot, new_identity, "subscribed");
            }
            TraceRecord::Unsubscribed {
                kind,
                slot,
                released,
            } => {
                debug!(kind = kind.get(), slot, released, "unsubscribed");
            }
            TraceRecord::Published { kind, mode } => {
                debug!(kind = kind.get(), ?mode, "published");
            }
            TraceRecord::Received { kind } => {
                debug!(kind = kind.get(), "received from queue");
            }
            TraceRecord::Dispatched { kind, delivered } => {
                debug!(kind = kind.get(), delivered, "dispatched");
            }
            TraceRecord::Rejected { op, kind, error } => {
                warn!(
                    op = op.as_str(),
                    kind = kind.map(EventType::get),
                    error = error.as_label(),
                    "{} failed: {}",
                    op.as_str(),
                    error
                );
            }
            TraceRecord::Destroyed => {
                info!("eventhub destroyed");
            }
        }
    }
}
