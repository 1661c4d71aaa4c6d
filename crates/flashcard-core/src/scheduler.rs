//! Leitner box scheduler.
//!
//! Pure functions: grading returns a new [`CardState`] and never touches
//! storage. Time is counted in whole days (see `BOX_DELAYS`).

use crate::config::BOX_DELAYS;
use crate::deck::Card;
use crate::input::Grade;

/// Leitner box. Higher boxes wait longer between reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum LeitnerBox {
    #[default]
    New = 0,
    Ok = 1,
    Good = 2,
}

impl LeitnerBox {
    /// All boxes in order
    pub const ALL: [Self; 3] = [Self::New, Self::Ok, Self::Good];

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Ok => "Ok",
            Self::Good => "Good",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::New),
            1 => Some(Self::Ok),
            2 => Some(Self::Good),
            _ => None,
        }
    }

    /// Next box up, saturating at `Good`
    pub const fn promote(self) -> Self {
        match self {
            Self::New => Self::Ok,
            Self::Ok | Self::Good => Self::Good,
        }
    }

    /// Review delay for cards entering this box
    pub const fn delay(self) -> u32 {
        BOX_DELAYS[self.index()]
    }
}

/// Mutable scheduling state of one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardState {
    pub leitner_box: LeitnerBox,
    /// Earliest day the card may be reviewed again
    pub due_at: u32,
}

impl CardState {
    pub const fn new(leitner_box: LeitnerBox, due_at: u32) -> Self {
        Self {
            leitner_box,
            due_at,
        }
    }

    /// Fresh card: box `New`, due immediately
    pub const fn fresh(now: u32) -> Self {
        Self::new(LeitnerBox::New, now)
    }

    pub const fn is_due(&self, now: u32) -> bool {
        self.due_at <= now
    }

    /// Apply a grade at `now`.
    pub fn graded(self, grade: Grade, now: u32) -> Self {
        match grade {
            Grade::Correct => {
                let leitner_box = self.leitner_box.promote();
                Self::new(leitner_box, now.saturating_add(leitner_box.delay()))
            }
            Grade::Incorrect => Self::fresh(now),
        }
    }
}

/// Outcome of looking for the next card to review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index of the card to review
    Due(usize),
    /// Cards exist but none is due yet
    NoCardsDue,
    /// The deck has no cards
    Empty,
}

/// First due card in deck order.
pub fn next_due(cards: &[Card], now: u32) -> Selection {
    next_due_after(cards, now, 0)
}

/// First due card at or after `start`, wrapping around to the deck start.
pub fn next_due_after(cards: &[Card], now: u32, start: usize) -> Selection {
    if cards.is_empty() {
        return Selection::Empty;
    }
    let start = start % cards.len();
    (start..cards.len())
        .chain(0..start)
        .find(|&index| cards[index].state.is_due(now))
        .map_or(Selection::NoCardsDue, Selection::Due)
}

/// Per-box card counts shown on the info screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeckStats {
    pub total: usize,
    pub due: usize,
    /// Count per box, indexed by `LeitnerBox::index`
    pub per_box: [usize; 3],
}

impl DeckStats {
    pub fn collect(cards: &[Card], now: u32) -> Self {
        let mut stats = Self {
            total: cards.len(),
            ..Self::default()
        };
        for card in cards {
            stats.per_box[card.state.leitner_box.index()] += 1;
            if card.state.is_due(now) {
                stats.due += 1;
            }
        }
        stats
    }

    pub fn in_box(&self, leitner_box: LeitnerBox) -> usize {
        self.per_box[leitner_box.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn card_due(due_at: u32) -> Card {
        Card::with_state("f", "b", CardState::new(LeitnerBox::New, due_at))
    }

    #[test]
    fn correct_promotes_new_to_ok() {
        let state = CardState::fresh(0).graded(Grade::Correct, 1000);
        assert_eq!(state, CardState::new(LeitnerBox::Ok, 1001));
    }

    #[test]
    fn correct_promotes_ok_to_good() {
        let state = CardState::new(LeitnerBox::Ok, 1000).graded(Grade::Correct, 1000);
        assert_eq!(state, CardState::new(LeitnerBox::Good, 1003));
    }

    #[test]
    fn correct_saturates_at_good() {
        let state = CardState::new(LeitnerBox::Good, 900).graded(Grade::Correct, 1000);
        assert_eq!(state.leitner_box, LeitnerBox::Good);
        assert_eq!(state.due_at, 1000 + BOX_DELAYS[2]);
    }

    #[test]
    fn incorrect_resets_to_new_due_now() {
        for leitner_box in LeitnerBox::ALL {
            let state = CardState::new(leitner_box, 5000).graded(Grade::Incorrect, 1000);
            assert_eq!(state, CardState::new(LeitnerBox::New, 1000));
        }
    }

    #[test]
    fn correct_never_decreases_box() {
        for leitner_box in LeitnerBox::ALL {
            let state = CardState::new(leitner_box, 0).graded(Grade::Correct, 10);
            assert!(state.leitner_box >= leitner_box);
            assert!(state.due_at >= 10);
        }
    }

    #[test]
    fn due_at_saturates_instead_of_wrapping() {
        let state = CardState::new(LeitnerBox::Ok, 0).graded(Grade::Correct, u32::MAX);
        assert_eq!(state.due_at, u32::MAX);
    }

    #[test]
    fn due_test_is_inclusive() {
        let state = CardState::new(LeitnerBox::Ok, 1000);
        assert!(state.is_due(1000));
        assert!(state.is_due(1001));
        assert!(!state.is_due(999));
    }

    #[test]
    fn selection_follows_deck_order_not_due_date() {
        let cards: Vec<Card> = [1000, 2000, 500].into_iter().map(card_due).collect();
        assert_eq!(next_due(&cards, 1000), Selection::Due(0));
    }

    #[test]
    fn selection_reports_nothing_due_and_empty() {
        let cards: Vec<Card> = [2000, 3000].into_iter().map(card_due).collect();
        assert_eq!(next_due(&cards, 1000), Selection::NoCardsDue);
        assert_eq!(next_due(&[], 1000), Selection::Empty);
    }

    #[test]
    fn selection_after_wraps_around() {
        let cards: Vec<Card> = [0, 5000, 0, 5000].into_iter().map(card_due).collect();
        assert_eq!(next_due_after(&cards, 1000, 1), Selection::Due(2));
        assert_eq!(next_due_after(&cards, 1000, 3), Selection::Due(0));
        assert_eq!(next_due_after(&cards, 1000, 9), Selection::Due(2));
    }

    #[test]
    fn box_from_u8_rejects_out_of_range() {
        assert_eq!(LeitnerBox::from_u8(2), Some(LeitnerBox::Good));
        assert_eq!(LeitnerBox::from_u8(3), None);
        assert_eq!(LeitnerBox::from_u8(255), None);
    }

    #[test]
    fn stats_count_boxes_and_due() {
        let cards = [
            Card::with_state("a", "a", CardState::new(LeitnerBox::New, 0)),
            Card::with_state("b", "b", CardState::new(LeitnerBox::Good, 2000)),
            Card::with_state("c", "c", CardState::new(LeitnerBox::Good, 10)),
        ];
        let stats = DeckStats::collect(&cards, 1000);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.due, 2);
        assert_eq!(stats.in_box(LeitnerBox::New), 1);
        assert_eq!(stats.in_box(LeitnerBox::Ok), 0);
        assert_eq!(stats.in_box(LeitnerBox::Good), 2);
    }
}
