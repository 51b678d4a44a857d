//! Hub configuration.
//!
//! Storage is sized at build time by the hub's const parameters; a [`HubConfig`]
//! picks the active limits and dispatch mode and is validated once, when the hub
//! is constructed.
//!
//! # TOML Example
//!
//! ```toml
//! mode = "queued"
//! strategy = "multi-type"
//! max_event_types = 10
//! max_slots = 8
//! queue_capacity = 16
//! lock_timeout = 5
//! enable_log = true
//! ```

use crate::error::ConfigError;
use crate::event::Timeout;
use crate::mask::BITS_PER_WORD;

/// How published events reach subscribers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DispatchMode {
    /// `publish` invokes matching callbacks before returning. No queue.
    #[default]
    Direct,
    /// `publish` enqueues; `process` dequeues and invokes.
    Queued,
}

/// Shape of a subscription slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SubscriptionStrategy {
    /// One event type per identity.
    SingleType,
    /// Any number of event types per identity, kept in a bitmask.
    #[default]
    MultiType,
}

/// Construction-time configuration of a [`Hub`](crate::Hub).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HubConfig {
    pub mode: DispatchMode,
    pub strategy: SubscriptionStrategy,
    /// Exclusive upper bound on event type tags.
    pub max_event_types: u32,
    /// Number of usable subscription slots.
    pub max_slots: usize,
    /// Queue depth in queued mode. Ignored in direct mode.
    pub queue_capacity: usize,
    /// Lock wait for subscribe, unsubscribe, process and snapshots.
    pub lock_timeout: Timeout,
    /// Emit trace records to the hub's sink.
    pub enable_log: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Direct,
            strategy: SubscriptionStrategy::MultiType,
            max_event_types: 10,
            max_slots: 8,
            queue_capacity: 16,
            lock_timeout: Timeout::NONE,
            enable_log: false,
        }
    }
}

impl HubConfig {
    /// Default configuration in queued mode.
    pub fn queued() -> Self {
        Self {
            mode: DispatchMode::Queued,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: SubscriptionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_max_event_types(mut self, max_event_types: u32) -> Self {
        self.max_event_types = max_event_types;
        self
    }

    #[must_use]
    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Timeout) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    #[must_use]
    pub fn with_log(mut self, enable_log: bool) -> Self {
        self.enable_log = enable_log;
        self
    }

    /// Checks the limits against table storage of `slots` slots and `words` mask words.
    pub fn validate(&self, slots: usize, words: usize) -> Result<(), ConfigError> {
        if self.max_slots == 0 || self.max_slots > slots {
            return Err(ConfigError::Slots {
                requested: self.max_slots,
                capacity: slots,
            });
        }
        let type_capacity = (words as u32).saturating_mul(BITS_PER_WORD);
        if self.max_event_types == 0 || self.max_event_types > type_capacity {
            return Err(ConfigError::EventTypes {
                requested: self.max_event_types,
                capacity: type_capacity,
            });
        }
        if self.mode == DispatchMode::Queued && self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        Ok(())
    }

    /// [`validate`](Self::validate) against the storage of a hub with `SLOTS` slots and `W` words.
    pub fn validate_for<const SLOTS: usize, const W: usize>(&self) -> Result<(), ConfigError> {
        self.validate(SLOTS, W)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "std")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|_| ConfigError::Parse)
    }
}
