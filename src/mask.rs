//! Fixed-width event-type bitmask.

use crate::event::EventType;

/// Bits held by one mask word.
pub const BITS_PER_WORD: u32 = u32::BITS;

/// Number of mask words needed to cover `event_types` event types.
///
/// Usable in const position: `Hub<P, NoTrace, 8, { mask_words(40) }>`.
pub const fn mask_words(event_types: u32) -> usize {
    event_types.div_ceil(BITS_PER_WORD) as usize
}

/// Set of event types over `[0, W * 32)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventMask<const W: usize> {
    words: [u32; W],
}

impl<const W: usize> Default for EventMask<W> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<const W: usize> EventMask<W> {
    pub const EMPTY: Self = Self { words: [0; W] };

    /// Number of event types the mask can represent.
    pub const CAPACITY: u32 = (W as u32) * BITS_PER_WORD;

    #[inline]
    const fn locate(kind: EventType) -> Option<(usize, u32)> {
        let raw = kind.get();
        if raw >= Self::CAPACITY {
            return None;
        }
        Some(((raw / BITS_PER_WORD) as usize, 1u32 << (raw % BITS_PER_WORD)))
    }

    /// Mask containing only `kind`. Out-of-range types give an empty mask.
    pub fn single(kind: EventType) -> Self {
        let mut mask = Self::EMPTY;
        mask.insert(kind);
        mask
    }

    /// Adds `kind`. Returns true if it was not already present.
    #[inline]
    pub fn insert(&mut self, kind: EventType) -> bool {
        match Self::locate(kind) {
            Some((word, bit)) => {
                let fresh = self.words[word] & bit == 0;
                self.words[word] |= bit;
                fresh
            }
            None => false,
        }
    }

    /// Removes `kind`. Returns true if it was present.
    #[inline]
    pub fn remove(&mut self, kind: EventType) -> bool {
        match Self::locate(kind) {
            Some((word, bit)) => {
                let present = self.words[word] & bit != 0;
                self.words[word] &= !bit;
                present
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, kind: EventType) -> bool {
        match Self::locate(kind) {
            Some((word, bit)) => self.words[word] & bit != 0,
            None => false,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.words = [0; W];
    }

    /// Lowest event type in the mask.
    pub fn first(&self) -> Option<EventType> {
        self.iter().next()
    }

    /// Event types in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            let base = i as u32 * BITS_PER_WORD;
            (0..BITS_PER_WORD)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| EventType::new(base + bit))
        })
    }
}
