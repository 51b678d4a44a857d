//! Error types returned by the hub and its configuration.
//!
//! - [`HubError`]: failures of a hub operation. Nothing is retried internally;
//!   the caller decides whether to try again.
//! - [`ConfigError`]: a [`HubConfig`](crate::HubConfig) that does not fit the hub's storage.

use thiserror::Error;

/// Port resource that could not be constructed during hub initialisation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    #[error("lock")]
    Lock,
    #[error("queue")]
    Queue,
}

/// Errors produced by hub operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// Event type outside `[0, max_event_types)`, or an oversized payload.
    #[error("invalid argument")]
    InvalidArgument,

    /// Every subscription slot is taken.
    #[error("subscription table full")]
    ResourceExhausted,

    /// No active subscription matches the callback and event type.
    #[error("subscription not found")]
    NotFound,

    /// Single-type table: the identity is already bound to another event type.
    #[error("subscriber already bound to event type {bound}")]
    AlreadyBound {
        /// Event type the identity currently watches.
        bound: u32,
    },

    /// The table lock could not be taken within the timeout.
    #[error("lock not acquired within timeout")]
    LockTimeout,

    /// The event queue stayed full for the whole timeout; the event was dropped.
    #[error("event queue full")]
    QueueFull,

    /// A port resource could not be constructed.
    #[error("{0} construction failed")]
    Init(Resource),

    /// The configuration was rejected at construction.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The hub has been destroyed.
    #[error("hub destroyed")]
    Destroyed,
}

impl HubError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HubError::InvalidArgument => "invalid_argument",
            HubError::ResourceExhausted => "resource_exhausted",
            HubError::NotFound => "not_found",
            HubError::AlreadyBound { .. } => "already_bound",
            HubError::LockTimeout => "lock_timeout",
            HubError::QueueFull => "queue_full",
            HubError::Init(Resource::Lock) => "init_lock",
            HubError::Init(Resource::Queue) => "init_queue",
            HubError::Config(_) => "invalid_config",
            HubError::Destroyed => "destroyed",
        }
    }
}

/// Reasons a [`HubConfig`](crate::HubConfig) is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_slots {requested} outside 1..={capacity}")]
    Slots { requested: usize, capacity: usize },

    #[error("max_event_types {requested} outside 1..={capacity}")]
    EventTypes { requested: u32, capacity: u32 },

    #[error("queue_capacity must be at least 1 in queued mode")]
    QueueCapacity,

    #[error("failed to parse configuration")]
    Parse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn labels_are_stable() {
        assert_eq!(HubError::QueueFull.as_label(), "queue_full");
        assert_eq!(HubError::Init(Resource::Queue).as_label(), "init_queue");
        assert_eq!(
            HubError::from(ConfigError::QueueCapacity).as_label(),
            "invalid_config"
        );
    }

    #[test]
    fn display_includes_details() {
        let err = HubError::AlreadyBound { bound: 3 };
        assert_eq!(err.to_string(), "subscriber already bound to event type 3");
        let err = HubError::Config(ConfigError::Slots {
            requested: 9,
            capacity: 8,
        });
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_slots 9 outside 1..=8"
        );
    }
}
