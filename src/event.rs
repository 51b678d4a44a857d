//! Event records and the scalar types they carry.

use crate::error::HubError;

/// Maximum number of payload bytes an [`Event`] carries inline.
pub const PAYLOAD_CAPACITY: usize = 32;

/// Inline payload bytes. Copied with the event, so queued events never borrow producer memory.
pub type Payload = heapless::Vec<u8, PAYLOAD_CAPACITY>;

/// Event type tag. Valid tags are below the hub's configured `max_event_types`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(u32);

impl EventType {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for EventType {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic millisecond timestamp. Wraps at `u32::MAX`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u32);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    #[inline]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, tolerant of one counter wrap.
    #[inline]
    pub const fn wrapping_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// Wait bound for a blocking port primitive, in scheduler ticks (1 tick = 1 ms on the bundled ports).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timeout(u32);

impl Timeout {
    /// Do not wait.
    pub const NONE: Self = Self(0);
    /// Wait without bound.
    pub const FOREVER: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_ticks(ticks: u32) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    #[inline]
    pub const fn ticks(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_forever(self) -> bool {
        self.0 == u32::MAX
    }
}

/// A published event.
///
/// `timestamp` is overwritten by the hub at publish time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventType,
    pub timestamp: Timestamp,
    pub payload: Payload,
}

impl Event {
    /// Event without payload.
    #[inline]
    pub const fn new(kind: EventType) -> Self {
        Self {
            kind,
            timestamp: Timestamp::ZERO,
            payload: heapless::Vec::new(),
        }
    }

    /// Event carrying a copy of `bytes`. Fails with [`HubError::InvalidArgument`]
    /// when `bytes` exceeds [`PAYLOAD_CAPACITY`].
    pub fn with_payload(kind: EventType, bytes: &[u8]) -> Result<Self, HubError> {
        let payload = Payload::from_slice(bytes).map_err(|_| HubError::InvalidArgument)?;
        Ok(Self {
            kind,
            timestamp: Timestamp::ZERO,
            payload,
        })
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
