//! Flashcard study engine for the Watchy e-paper watch.
//! Works on ESP32 and on the host (tests, scenario harness).

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

extern crate alloc;

pub mod app;
pub mod codec;
pub mod config;
pub mod deck;
pub mod input;
pub mod memory_store;
pub mod power;
pub mod record;
pub mod review;
pub mod scheduler;
pub mod store;
pub mod test_display;
pub mod view;

pub use app::StudyApp;
pub use codec::{decode, decode_records, encode, encode_records, CorruptionError};
pub use config::{
    BuilderError, StudyConfig, StudyConfigBuilder, BOX_DELAYS, DEEP_SLEEP_TIMEOUT_MS,
    FULL_REFRESH_THRESHOLD, MAX_CARD_COUNT, MAX_TEXT_WIDTH, NVS_NAMESPACE_SIZE, RECORD_WIDTH,
};
pub use deck::{Card, Deck, ImportReport};
pub use input::{Grade, ReviewEvent};
pub use memory_store::{MemoryStore, MemoryStoreError};
pub use power::{IdleTimer, RefreshCounter, RefreshMode};
pub use record::{parse_record, parse_record_line, Field, Record, RecordError};
pub use review::{ErrorReason, Handled, ReviewSession, ReviewState};
pub use scheduler::{CardState, DeckStats, LeitnerBox, Selection};
pub use store::{record_key, DeckStore, KeyValueStore, LoadOutcome, Namespace, StoreError};
pub use test_display::TestDisplay;
pub use view::{render, InfoPage, Screen, Surface};

/// Watchy panel dimensions (GDEH0154D67, 200x200).
pub const DISPLAY_WIDTH: u32 = 200;
pub const DISPLAY_HEIGHT: u32 = 200;
