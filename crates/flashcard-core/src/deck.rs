//! Cards, the deck that owns them, and import from delimited text.

use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::encode_records;
use crate::config::MAX_CARD_COUNT;
use crate::record::{parse_record_line, RecordError};
use crate::scheduler::CardState;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One flashcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub front: String,
    pub back: String,
    pub state: CardState,
}

impl Card {
    /// New card: box `New`, due immediately
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self::with_state(front, back, CardState::default())
    }

    pub fn with_state(front: impl Into<String>, back: impl Into<String>, state: CardState) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            state,
        }
    }
}

/// Result counters of one import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// Lines missing a delimiter
    pub malformed: usize,
    /// Lines with an empty front or back
    pub empty_fields: usize,
    /// Valid lines dropped because the deck was full
    pub overflow: usize,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.malformed + self.empty_fields
    }

    pub fn truncated(&self) -> bool {
        self.overflow > 0
    }
}

/// Ordered card collection, at most `MAX_CARD_COUNT` cards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import cards from `index;front;back` lines.
    ///
    /// Bad lines are skipped and counted; blank lines are ignored. Cards keep
    /// file order. Valid lines past `MAX_CARD_COUNT` are counted as overflow.
    pub fn import(text: &str) -> (Self, ImportReport) {
        let mut deck = Self::new();
        let mut report = ImportReport::default();
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record_line(line) {
                Ok(record) => match deck.push(Card::new(record.front, record.back)) {
                    Ok(position) => {
                        log::trace!("Import: record {} is card {}", record.index, position);
                        report.imported += 1;
                    }
                    Err(_) => report.overflow += 1,
                },
                Err(err) => {
                    log::warn!("Import: skipping line {}: {}", line_no + 1, err);
                    match err {
                        RecordError::MalformedRecord => report.malformed += 1,
                        RecordError::EmptyField(_) => report.empty_fields += 1,
                    }
                }
            }
        }

        if report.truncated() {
            log::warn!(
                "Import: deck full at {} cards, dropped {}",
                MAX_CARD_COUNT,
                report.overflow
            );
        }
        log::info!(
            "Import: {} cards, {} skipped",
            report.imported,
            report.skipped()
        );
        (deck, report)
    }

    /// Append a card, handing it back if the deck is full
    pub fn push(&mut self, card: Card) -> Result<usize, Card> {
        if self.cards.len() >= MAX_CARD_COUNT {
            return Err(card);
        }
        self.cards.push(card);
        Ok(self.cards.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn states(&self) -> impl Iterator<Item = CardState> + '_ {
        self.cards.iter().map(|card| card.state)
    }

    /// Replace a card's scheduling state. Returns false for unknown indices.
    pub fn set_state(&mut self, index: usize, state: CardState) -> bool {
        match self.cards.get_mut(index) {
            Some(card) => {
                card.state = state;
                true
            }
            None => false,
        }
    }

    /// Encode every card's state, in deck order
    pub fn snapshot(&self) -> Vec<u8> {
        encode_records(self.states())
    }

    /// Put every card back in box `New`, due at `now`
    pub fn reset_states(&mut self, now: u32) {
        for card in &mut self.cards {
            card.state = CardState::fresh(now);
        }
    }
}
