//! Card state persistence over a namespaced key-value store.
//!
//! Each card's record lives under [`record_key`] of its deck index inside one
//! namespace. Records are written before the in-memory card changes, so a
//! failed write leaves both sides untouched.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{decode, decode_records, encode, CorruptionError};
use crate::config::{DEFAULT_NAMESPACE, MAX_CARD_COUNT, NVS_NAMESPACE_SIZE, RECORD_WIDTH};
use crate::deck::Deck;
use crate::scheduler::CardState;

/// Validated key-value namespace name (1 to `NVS_NAMESPACE_SIZE` bytes)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: &str) -> Option<Self> {
        if name.is_empty() || name.len() > NVS_NAMESPACE_SIZE {
            return None;
        }
        Some(Self(String::from(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(String::from(DEFAULT_NAMESPACE))
    }
}

impl core::fmt::Display for Namespace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of the record for the card at `index`
pub fn record_key(index: usize) -> String {
    format!("c{}", index)
}

/// Trait for persistent byte-blob storage
///
/// Implementations:
/// - `NvsStore` on the watch (ESP-IDF NVS)
/// - [`MemoryStore`](crate::memory_store::MemoryStore) for tests and host tools
///
/// A `set` must either replace the whole value or fail.
pub trait KeyValueStore {
    type Error: core::fmt::Debug;

    /// Read the value stored under `key`
    fn get(&mut self, namespace: &Namespace, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, namespace: &Namespace, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&mut self, namespace: &Namespace, key: &str) -> Result<bool, Self::Error>;
}

/// Errors from deck persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError<E> {
    /// The key-value backend failed
    Backend(E),
    /// A snapshot failed validation
    Corrupted(CorruptionError),
    /// Namespace name is empty or too long
    InvalidNamespace { len: usize },
    /// No card at this deck index
    NoSuchCard(usize),
}

impl<E: core::fmt::Debug> core::fmt::Display for StoreError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::Backend(err) => write!(f, "Storage error: {:?}", err),
            StoreError::Corrupted(err) => write!(f, "{}", err),
            StoreError::InvalidNamespace { len } => write!(
                f,
                "Invalid namespace length {len} (must be 1..={NVS_NAMESPACE_SIZE} bytes)"
            ),
            StoreError::NoSuchCard(index) => write!(f, "No card at index {index}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for StoreError<E> {}

impl<E> From<CorruptionError> for StoreError<E> {
    fn from(value: CorruptionError) -> Self {
        StoreError::Corrupted(value)
    }
}

/// How persisted state was applied to a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored records were applied; `restored` cards had one
    Loaded { restored: usize },
    /// Stored state was corrupted and has been discarded
    Reset(CorruptionError),
}

/// Deck persistence bound to one namespace
pub struct DeckStore<S: KeyValueStore> {
    backend: S,
    namespace: Namespace,
}

impl<S: KeyValueStore> DeckStore<S> {
    pub fn new(backend: S, namespace: Namespace) -> Self {
        Self { backend, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Read the record for one card. `None` if the card was never graded.
    pub fn read(&mut self, index: usize) -> Result<Option<CardState>, StoreError<S::Error>> {
        let Some(bytes) = self
            .backend
            .get(&self.namespace, &record_key(index))
            .map_err(StoreError::Backend)?
        else {
            return Ok(None);
        };
        let (leitner_box, due_at) = decode(&bytes)?;
        Ok(Some(CardState::new(leitner_box, due_at)))
    }

    /// Apply persisted records to `deck`.
    ///
    /// Every record is validated before any card changes. On corruption the
    /// deck's stored state is erased and all cards restart in box `New`, due
    /// at `now`.
    pub fn load(&mut self, deck: &mut Deck, now: u32) -> Result<LoadOutcome, StoreError<S::Error>> {
        let mut stored = Vec::with_capacity(deck.len());
        for index in 0..deck.len() {
            match self.read(index) {
                Ok(state) => stored.push(state),
                Err(StoreError::Corrupted(err)) => {
                    log::warn!(
                        "Store[{}]: card {} corrupted ({}), resetting deck",
                        self.namespace,
                        index,
                        err
                    );
                    if let Err(erase_err) = self.reset(deck, now) {
                        log::error!("Store[{}]: erase failed: {}", self.namespace, erase_err);
                        deck.reset_states(now);
                    }
                    return Ok(LoadOutcome::Reset(err));
                }
                Err(err) => return Err(err),
            }
        }

        let mut restored = 0;
        for (index, state) in stored.into_iter().enumerate() {
            if let Some(state) = state {
                deck.set_state(index, state);
                restored += 1;
            }
        }
        log::info!(
            "Store[{}]: restored {}/{} cards",
            self.namespace,
            restored,
            deck.len()
        );
        Ok(LoadOutcome::Loaded { restored })
    }

    /// Persist one card's state
    pub fn save(&mut self, index: usize, state: CardState) -> Result<(), StoreError<S::Error>> {
        self.backend
            .set(
                &self.namespace,
                &record_key(index),
                &encode(state.leitner_box, state.due_at),
            )
            .map_err(StoreError::Backend)
    }

    /// Persist `state` for the card at `index`, then apply it to the deck.
    pub fn commit(
        &mut self,
        deck: &mut Deck,
        index: usize,
        state: CardState,
    ) -> Result<(), StoreError<S::Error>> {
        if deck.get(index).is_none() {
            return Err(StoreError::NoSuchCard(index));
        }
        self.save(index, state)?;
        deck.set_state(index, state);
        Ok(())
    }

    /// Reset every card to `New` due at `now` and erase all stored records.
    ///
    /// The deck is only touched once every record is gone.
    pub fn reset(&mut self, deck: &mut Deck, now: u32) -> Result<(), StoreError<S::Error>> {
        for index in 0..MAX_CARD_COUNT {
            self.backend
                .remove(&self.namespace, &record_key(index))
                .map_err(StoreError::Backend)?;
        }
        deck.reset_states(now);
        Ok(())
    }

    /// Whole-deck snapshot for [`DeckStore::restore`]
    pub fn export(&self, deck: &Deck) -> Vec<u8> {
        deck.snapshot()
    }

    /// Replace the deck's state with a snapshot from [`DeckStore::export`].
    ///
    /// The snapshot must hold exactly one record per card. Either every
    /// record is written and the deck takes the snapshot, or the previous
    /// records are written back and the deck is left alone.
    pub fn restore(&mut self, deck: &mut Deck, blob: &[u8]) -> Result<(), StoreError<S::Error>> {
        let states = decode_records(blob)?;
        if states.len() != deck.len() {
            return Err(StoreError::Corrupted(CorruptionError::BadLength {
                len: blob.len(),
                expected: Some(deck.len() * RECORD_WIDTH),
            }));
        }

        let mut previous = Vec::with_capacity(states.len());
        for index in 0..states.len() {
            let bytes = self
                .backend
                .get(&self.namespace, &record_key(index))
                .map_err(StoreError::Backend)?;
            previous.push(bytes);
        }

        for (index, state) in states.iter().enumerate() {
            if let Err(err) = self.save(index, *state) {
                log::warn!(
                    "Store[{}]: restore failed at card {}, rolling back",
                    self.namespace,
                    index
                );
                self.roll_back(&previous[..index]);
                return Err(err);
            }
        }

        for (index, state) in states.into_iter().enumerate() {
            deck.set_state(index, state);
        }
        log::info!("Store[{}]: restored {} cards", self.namespace, deck.len());
        Ok(())
    }

    /// Put back the raw records of cards `0..previous.len()`.
    fn roll_back(&mut self, previous: &[Option<Vec<u8>>]) {
        for (index, bytes) in previous.iter().enumerate() {
            let key = record_key(index);
            let result = match bytes {
                Some(bytes) => self.backend.set(&self.namespace, &key, bytes),
                None => self.backend.remove(&self.namespace, &key).map(|_| ()),
            };
            if let Err(err) = result {
                log::error!(
                    "Store[{}]: rollback of card {} failed: {:?}",
                    self.namespace,
                    index,
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::scheduler::LeitnerBox;

    fn deck() -> Deck {
        Deck::import("1;a;A\n2;b;B\n3;c;C").0
    }

    fn store() -> DeckStore<MemoryStore> {
        DeckStore::new(MemoryStore::new(), Namespace::default())
    }

    #[test]
    fn keys_are_stable_per_index() {
        assert_eq!(record_key(0), "c0");
        assert_eq!(record_key(254), "c254");
        assert_eq!(record_key(7), record_key(7));
    }

    #[test]
    fn namespace_length_is_validated() {
        assert!(Namespace::new("").is_none());
        assert!(Namespace::new(&"x".repeat(33)).is_none());
        assert!(Namespace::new(&"x".repeat(32)).is_some());
    }

    #[test]
    fn load_applies_saved_records() {
        let mut store = store();
        store
            .save(1, CardState::new(LeitnerBox::Good, 1003))
            .unwrap();

        let mut deck = deck();
        let outcome = store.load(&mut deck, 1000).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { restored: 1 });
        assert_eq!(
            deck.get(1).unwrap().state,
            CardState::new(LeitnerBox::Good, 1003)
        );
        assert_eq!(deck.get(0).unwrap().state, CardState::default());
    }

    #[test]
    fn short_record_resets_whole_deck() {
        let mut store = store();
        store
            .save(0, CardState::new(LeitnerBox::Good, 1003))
            .unwrap();
        let ns = store.namespace().clone();
        store
            .backend_mut()
            .set(&ns, &record_key(2), &[1, 2, 3])
            .unwrap();

        let mut deck = deck();
        let outcome = store.load(&mut deck, 1000).unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Reset(CorruptionError::BadLength {
                len: 3,
                expected: None
            })
        );
        assert!(deck.states().all(|s| s == CardState::fresh(1000)));
        assert!(store.backend().is_empty());
    }

    #[test]
    fn invalid_box_resets_whole_deck() {
        let mut store = store();
        let ns = store.namespace().clone();
        store
            .backend_mut()
            .set(&ns, &record_key(0), &[7, 0, 0, 0, 0])
            .unwrap();
        let mut deck = deck();
        assert!(matches!(
            store.load(&mut deck, 5),
            Ok(LoadOutcome::Reset(CorruptionError::InvalidBox { value: 7, .. }))
        ));
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let mut store = store();
        let mut deck = deck();
        store
            .commit(&mut deck, 0, CardState::new(LeitnerBox::Ok, 11))
            .unwrap();

        store.backend_mut().fail_writes(true);
        let result = store.commit(&mut deck, 0, CardState::new(LeitnerBox::Good, 13));
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(deck.get(0).unwrap().state, CardState::new(LeitnerBox::Ok, 11));

        store.backend_mut().fail_writes(false);
        assert_eq!(
            store.read(0).unwrap(),
            Some(CardState::new(LeitnerBox::Ok, 11))
        );
    }

    #[test]
    fn commit_rejects_unknown_card() {
        let mut store = store();
        let mut deck = deck();
        assert_eq!(
            store.commit(&mut deck, 3, CardState::default()),
            Err(StoreError::NoSuchCard(3))
        );
    }

    #[test]
    fn restore_requires_one_record_per_card() {
        let mut store = store();
        let mut deck = deck();

        let short = crate::codec::encode_records([CardState::default(); 2]);
        assert_eq!(
            store.restore(&mut deck, &short),
            Err(StoreError::Corrupted(CorruptionError::BadLength {
                len: 10,
                expected: Some(15)
            }))
        );

        let mut source = deck.clone();
        source.set_state(2, CardState::new(LeitnerBox::Good, 42));
        store.restore(&mut deck, &source.snapshot()).unwrap();
        assert_eq!(deck, source);
        assert_eq!(
            store.read(2).unwrap(),
            Some(CardState::new(LeitnerBox::Good, 42))
        );
    }

    #[test]
    fn failed_erase_still_resets_deck_in_memory() {
        let mut store = store();
        let ns = store.namespace().clone();
        store
            .backend_mut()
            .set(&ns, &record_key(1), &[1, 2, 3])
            .unwrap();
        store.backend_mut().fail_writes(true);

        let mut deck = deck();
        deck.set_state(0, CardState::new(LeitnerBox::Good, 50));
        let outcome = store.load(&mut deck, 1000).unwrap();
        assert!(matches!(outcome, LoadOutcome::Reset(_)));
        assert!(deck.states().all(|s| s == CardState::fresh(1000)));
        assert_eq!(store.backend().peek(&ns, &record_key(1)), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn restore_rolls_back_when_a_write_fails() {
        let mut store = store();
        let mut deck = deck();
        store
            .commit(&mut deck, 0, CardState::new(LeitnerBox::Ok, 7))
            .unwrap();
        let before = deck.clone();

        let snapshot = crate::codec::encode_records([CardState::new(LeitnerBox::Good, 99); 3]);
        store.backend_mut().fail_write_at(1);
        assert!(matches!(
            store.restore(&mut deck, &snapshot),
            Err(StoreError::Backend(_))
        ));

        assert_eq!(deck, before);
        assert_eq!(
            store.read(0).unwrap(),
            Some(CardState::new(LeitnerBox::Ok, 7))
        );
        assert_eq!(store.read(1).unwrap(), None);
        assert_eq!(store.read(2).unwrap(), None);

        store.restore(&mut deck, &snapshot).unwrap();
        assert!(deck
            .states()
            .all(|s| s == CardState::new(LeitnerBox::Good, 99)));
    }

    #[test]
    fn restore_rollback_removes_records_that_were_absent() {
        let mut store = store();
        let mut deck = deck();
        let snapshot = crate::codec::encode_records([CardState::new(LeitnerBox::Ok, 3); 3]);
        store.backend_mut().fail_write_at(2);
        assert!(store.restore(&mut deck, &snapshot).is_err());
        assert!(store.backend().is_empty());
        assert!(deck.states().all(|s| s == CardState::default()));
    }

    #[test]
    fn namespaces_are_isolated() {
        let mut backend = MemoryStore::new();
        let other = Namespace::new("other").unwrap();
        backend.set(&other, &record_key(0), &[9, 9, 9]).unwrap();

        let mut store = DeckStore::new(backend, Namespace::default());
        let mut deck = deck();
        assert_eq!(
            store.load(&mut deck, 0).unwrap(),
            LoadOutcome::Loaded { restored: 0 }
        );
    }
}
