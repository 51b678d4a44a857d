//! Publish/subscribe event hub for no-std embedded targets.
//!
//! # Highlights
//! - Fixed-capacity subscription table, no allocation after construction.
//! - Direct dispatch for a bare-metal main loop, queued dispatch for an RTOS consumer task.
//! - One engine for both table shapes: one event type per subscriber, or a bitmask per subscriber.
//! - Host primitives (lock, clock, queue) come from a [`Port`] adapter.
//!
//! # Quick start
//! ```
//! use ph_eventhub::{BareMetalPort, Context, Event, EventType, Hub, HubConfig, Timeout};
//!
//! const POWER_ON: EventType = EventType::new(1);
//!
//! fn on_power(event: &Event, _ctx: Context) {
//!     assert_eq!(event.kind, POWER_ON);
//! }
//!
//! let hub: Hub<_> = Hub::new(HubConfig::default(), BareMetalPort::new()).unwrap();
//! hub.subscribe(POWER_ON, on_power, Context::NONE).unwrap();
//! hub.publish(Event::new(POWER_ON), Timeout::NONE).unwrap();
//! ```
//!
//! # No-std
//! The crate is `#![no_std]`. The `std` feature (on by default) adds the hosted
//! [`port::hosted`] adapter and TOML configuration loading. Tests require `std`.
//!
//! # Safety and concurrency
//! The subscription table lives behind the port's lock. Callbacks run while that lock is held:
//! they must return promptly and must not call back into the same hub. A re-entrant call
//! fails with [`HubError::LockTimeout`] on the bare-metal port and waits out the
//! timeout on the hosted port.
//!
//! # Semantics
//! - `publish` stamps the event with the port clock, whatever timestamp the caller set.
//! - Matching subscribers are invoked in ascending slot order.
//! - Queued mode drops an event when the queue stays full for the whole timeout; nothing is retried.
#![no_std]

pub mod config;
pub mod error;
pub mod event;
pub mod hub;
pub mod mask;
pub mod port;
pub mod ring;
pub mod table;
pub mod trace;

pub use config::{DispatchMode, HubConfig, SubscriptionStrategy};
pub use error::{ConfigError, HubError, Resource};
pub use event::{Event, EventType, PAYLOAD_CAPACITY, Payload, Timeout, Timestamp};
pub use hub::{Hub, ProcessStats};
pub use mask::{EventMask, mask_words};
pub use port::baremetal::{BareMetalPort, TickCounter};
#[cfg(feature = "std")]
pub use port::hosted::HostedPort;
pub use port::{Clock, EventQueue, Port, RawLock};
pub use ring::EventRing;
pub use table::{Callback, Context, SubscriptionTable};
pub use trace::{NoTrace, TraceRecord, TraceSink};
#[cfg(feature = "tracing")]
pub use trace::TracingSink;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub(crate) mod atomic {
    #[cfg(not(feature = "portable-atomic"))]
    pub use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    #[cfg(feature = "portable-atomic")]
    pub use portable_atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
}
