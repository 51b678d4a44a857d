//! Fixed-capacity subscription table.
//!
//! # Overview
//! - Each slot holds one subscriber identity: a [`Callback`] plus its [`Context`].
//! - A slot watches a set of event types stored as an [`EventMask`]. The slot is in use
//!   exactly while that set is non-empty.
//! - [`SubscriptionStrategy::SingleType`] limits each identity to one event type;
//!   [`SubscriptionStrategy::MultiType`] lets one identity watch many.
//! - New identities always take the lowest free slot, and matching walks slots in
//!   ascending order, so registration and delivery order are deterministic.
//!
//! The table is not synchronised; the hub guards it with the port lock.

use crate::config::SubscriptionStrategy;
use crate::error::HubError;
use crate::event::{Event, EventType};
use crate::mask::EventMask;

/// Subscriber callback. Runs with the table lock held.
pub type Callback = fn(&Event, Context);

/// Opaque, caller-owned handle passed back to the callback. The hub never dereferences it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Context(usize);

impl Context {
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Handle naming `target` by address.
    #[inline]
    pub fn from_ref<T>(target: &T) -> Self {
        Self(target as *const T as usize)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

#[inline]
fn same_callback(a: Callback, b: Callback) -> bool {
    core::ptr::fn_addr_eq(a, b)
}

#[derive(Copy, Clone, Debug)]
struct Slot<const W: usize> {
    callback: Option<Callback>,
    context: Context,
    mask: EventMask<W>,
}

impl<const W: usize> Slot<W> {
    const FREE: Self = Self {
        callback: None,
        context: Context::NONE,
        mask: EventMask::EMPTY,
    };

    #[inline]
    fn in_use(&self) -> bool {
        self.callback.is_some() && !self.mask.is_empty()
    }

    #[inline]
    fn is_identity(&self, callback: Callback, context: Context) -> bool {
        self.in_use()
            && self.context == context
            && self.callback.is_some_and(|cb| same_callback(cb, callback))
    }

    #[inline]
    fn has_callback(&self, callback: Callback) -> bool {
        self.in_use() && self.callback.is_some_and(|cb| same_callback(cb, callback))
    }
}

impl<const W: usize> PartialEq for Slot<W> {
    fn eq(&self, other: &Self) -> bool {
        let callbacks = match (self.callback, other.callback) {
            (Some(a), Some(b)) => same_callback(a, b),
            (None, None) => true,
            _ => false,
        };
        callbacks && self.context == other.context && self.mask == other.mask
    }
}

impl<const W: usize> Eq for Slot<W> {}

/// Result of a successful subscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Subscribed {
    pub slot: usize,
    /// True when the identity claimed a free slot.
    pub new_identity: bool,
}

/// Result of a successful unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Unsubscribed {
    pub slot: usize,
    /// True when the slot's last event type was removed and the slot is free again.
    pub released: bool,
}

/// Subscription table with storage for `SLOTS` identities and `W * 32` event types.
///
/// The active limits (`max_slots`, `max_event_types`) may be lower than the storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionTable<const SLOTS: usize, const W: usize> {
    slots: [Slot<W>; SLOTS],
    max_slots: usize,
    max_event_types: u32,
    strategy: SubscriptionStrategy,
}

impl<const SLOTS: usize, const W: usize> SubscriptionTable<SLOTS, W> {
    /// Empty table. Limits are clamped to the storage size.
    pub fn new(max_slots: usize, max_event_types: u32, strategy: SubscriptionStrategy) -> Self {
        Self {
            slots: [Slot::FREE; SLOTS],
            max_slots: max_slots.min(SLOTS),
            max_event_types: max_event_types.min(EventMask::<W>::CAPACITY),
            strategy,
        }
    }

    #[inline]
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    #[inline]
    pub fn max_event_types(&self) -> u32 {
        self.max_event_types
    }

    #[inline]
    pub fn strategy(&self) -> SubscriptionStrategy {
        self.strategy
    }

    #[inline]
    fn check_kind(&self, kind: EventType) -> Result<(), HubError> {
        if kind.get() < self.max_event_types {
            Ok(())
        } else {
            Err(HubError::InvalidArgument)
        }
    }

    #[inline]
    fn active_slots(&self) -> &[Slot<W>] {
        &self.slots[..self.max_slots]
    }

    /// Registers `(callback, context)` for `kind`.
    ///
    /// An existing identity gains `kind` (multi-type) or must already watch it
    /// (single-type, otherwise [`HubError::AlreadyBound`]). A new identity takes the
    /// lowest free slot, or fails with [`HubError::ResourceExhausted`] leaving the
    /// table untouched.
    pub fn subscribe(
        &mut self,
        kind: EventType,
        callback: Callback,
        context: Context,
    ) -> Result<Subscribed, HubError> {
        self.check_kind(kind)?;
        let limit = self.max_slots;

        if let Some(idx) = self.slots[..limit]
            .iter()
            .position(|s| s.is_identity(callback, context))
        {
            let slot = &mut self.slots[idx];
            match self.strategy {
                SubscriptionStrategy::MultiType => {
                    slot.mask.insert(kind);
                }
                SubscriptionStrategy::SingleType => {
                    if !slot.mask.contains(kind) {
                        let bound = slot.mask.first().map_or(0, EventType::get);
                        return Err(HubError::AlreadyBound { bound });
                    }
                }
            }
            return Ok(Subscribed {
                slot: idx,
                new_identity: false,
            });
        }

        let idx = self.slots[..limit]
            .iter()
            .position(|s| !s.in_use())
            .ok_or(HubError::ResourceExhausted)?;
        self.slots[idx] = Slot {
            callback: Some(callback),
            context,
            mask: EventMask::single(kind),
        };
        Ok(Subscribed {
            slot: idx,
            new_identity: true,
        })
    }

    /// Removes `kind` from the first slot whose callback is `callback` and which watches
    /// `kind`. The context is not compared. The slot is freed once its set is empty.
    pub fn unsubscribe(
        &mut self,
        kind: EventType,
        callback: Callback,
    ) -> Result<Unsubscribed, HubError> {
        self.check_kind(kind)?;
        let limit = self.max_slots;

        let idx = self.slots[..limit]
            .iter()
            .position(|s| s.has_callback(callback) && s.mask.contains(kind))
            .ok_or(HubError::NotFound)?;

        let slot = &mut self.slots[idx];
        slot.mask.remove(kind);
        let released = slot.mask.is_empty();
        if released {
            *slot = Slot::FREE;
        }
        Ok(Unsubscribed { slot: idx, released })
    }

    /// Subscribers watching `kind`, in ascending slot order.
    pub fn matching(&self, kind: EventType) -> impl Iterator<Item = (Callback, Context)> + '_ {
        self.active_slots()
            .iter()
            .filter(move |s| s.in_use() && s.mask.contains(kind))
            .filter_map(|s| s.callback.map(|cb| (cb, s.context)))
    }

    /// True if `(callback, context)` is registered for `kind`.
    pub fn watches(&self, kind: EventType, callback: Callback, context: Context) -> bool {
        self.active_slots()
            .iter()
            .any(|s| s.is_identity(callback, context) && s.mask.contains(kind))
    }

    /// Event types watched by the slot at `idx`, if that slot is in use.
    pub fn slot_mask(&self, idx: usize) -> Option<EventMask<W>> {
        self.active_slots()
            .get(idx)
            .filter(|s| s.in_use())
            .map(|s| s.mask)
    }

    /// Number of slots in use.
    pub fn len(&self) -> usize {
        self.active_slots().iter().filter(|s| s.in_use()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.max_slots
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.slots = [Slot::FREE; SLOTS];
    }
}
