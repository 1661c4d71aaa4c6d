//! Review state machine.
//!
//! ```text
//!            reveal              grade
//!   RECTO ----------> VERSO ------------> RECTO (next card)
//!     |                 |
//!     +--request-info---+---> INFO --dismiss--> RECTO
//!
//!   any --card-data-invalid--> ERROR --recover--> RECTO (fresh selection)
//! ```
//!
//! `ReviewState::on_event` is the bare transition table. `ReviewSession`
//! drives it against a deck and its store: grading goes through the
//! scheduler and is persisted before the session moves on.

use crate::codec::CorruptionError;
use crate::config::StudyConfig;
use crate::deck::{Card, Deck};
use crate::input::ReviewEvent;
use crate::power::{RefreshCounter, RefreshMode};
use crate::scheduler::{next_due, next_due_after, Selection};
use crate::store::{DeckStore, KeyValueStore, LoadOutcome, StoreError};

/// Review screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewState {
    /// Showing the front of the card
    #[default]
    Recto,
    /// Showing the back of the card
    Verso,
    /// Showing card and deck metadata
    Info,
    /// Invalid card data was encountered
    Error,
}

impl ReviewState {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewState::Recto => "RECTO",
            ReviewState::Verso => "VERSO",
            ReviewState::Info => "INFO",
            ReviewState::Error => "ERROR",
        }
    }

    /// Target state for `event`, or `None` if the event does not apply here.
    ///
    /// `Error` is reachable from every state and only `Recover` leaves it.
    pub const fn on_event(self, event: ReviewEvent) -> Option<ReviewState> {
        match (self, event) {
            (_, ReviewEvent::CardDataInvalid) => Some(ReviewState::Error),
            (ReviewState::Error, ReviewEvent::Recover) => Some(ReviewState::Recto),
            (ReviewState::Error, _) => None,
            (ReviewState::Recto, ReviewEvent::Reveal) => Some(ReviewState::Verso),
            (ReviewState::Verso, ReviewEvent::Grade(_)) => Some(ReviewState::Recto),
            (ReviewState::Recto | ReviewState::Verso, ReviewEvent::RequestInfo) => {
                Some(ReviewState::Info)
            }
            (ReviewState::Info, ReviewEvent::Dismiss) => Some(ReviewState::Recto),
            _ => None,
        }
    }
}

/// Why the session is in `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    /// Stored state was corrupted; the deck was reset to defaults
    Corrupted(CorruptionError),
    /// The selected index no longer addresses a card
    MissingCard(usize),
    /// Raised from outside the engine
    Reported,
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorReason::Corrupted(err) => write!(f, "{}. Progress was reset.", err),
            ErrorReason::MissingCard(index) => write!(f, "Card {} is missing", index + 1),
            ErrorReason::Reported => write!(f, "Invalid card data"),
        }
    }
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Event consumed; the screen should be redrawn
    Consumed,
    /// Event does not apply in the current state
    Ignored,
}

/// One review session over a deck
#[derive(Debug, Clone)]
pub struct ReviewSession {
    state: ReviewState,
    selection: Selection,
    error: Option<ErrorReason>,
    refresh: RefreshCounter,
    reviewed: u32,
}

impl ReviewSession {
    /// Start on the first due card, or in `Error` if loading reset the deck.
    pub fn start(deck: &Deck, now: u32, load: LoadOutcome, config: &StudyConfig) -> Self {
        let mut session = Self {
            state: ReviewState::Recto,
            selection: next_due(deck.cards(), now),
            error: None,
            refresh: RefreshCounter::new(config.full_refresh_threshold),
            reviewed: 0,
        };
        if let LoadOutcome::Reset(err) = load {
            session.enter_error(ErrorReason::Corrupted(err));
        }
        session
    }

    /// Start with default configuration on an intact deck
    pub fn new(deck: &Deck, now: u32) -> Self {
        Self::start(
            deck,
            now,
            LoadOutcome::Loaded { restored: 0 },
            &StudyConfig::default(),
        )
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Index of the card on screen, if any
    pub fn current_index(&self) -> Option<usize> {
        match (self.state, self.selection) {
            (ReviewState::Error, _) => None,
            (_, Selection::Due(index)) => Some(index),
            _ => None,
        }
    }

    pub fn current_card<'d>(&self, deck: &'d Deck) -> Option<&'d Card> {
        self.current_index().and_then(|index| deck.get(index))
    }

    pub fn error(&self) -> Option<ErrorReason> {
        self.error
    }

    /// Completed grades in this session
    pub fn reviewed(&self) -> u32 {
        self.reviewed
    }

    /// Refresh mode for the next draw
    pub fn refresh_mode(&mut self) -> RefreshMode {
        self.refresh.take()
    }

    /// Look for a due card again when the session is idle on a placeholder.
    ///
    /// Returns true if a card is now on screen.
    pub fn poll(&mut self, deck: &Deck, now: u32) -> bool {
        if self.state != ReviewState::Recto || self.current_index().is_some() {
            return false;
        }
        self.selection = next_due(deck.cards(), now);
        self.current_index().is_some()
    }

    /// Drive the session into `Error` from outside the engine
    pub fn report_invalid(&mut self, reason: ErrorReason) {
        self.enter_error(reason);
    }

    /// Back to the front of the first due card after the deck was reset or
    /// restored from outside the session.
    ///
    /// An error screen stays up: only [`ReviewEvent::Recover`] leaves `Error`,
    /// and it selects the first due card of the new deck state.
    pub fn restart(&mut self, deck: &Deck, now: u32) {
        self.refresh.request_full();
        if self.state == ReviewState::Error {
            return;
        }
        self.state = ReviewState::Recto;
        self.selection = next_due(deck.cards(), now);
    }

    /// Apply one input event.
    ///
    /// # Errors
    ///
    /// Returns the store error if persisting a grade fails. The session then
    /// stays on the revealed card and neither deck nor store has changed.
    pub fn handle<S: KeyValueStore>(
        &mut self,
        event: ReviewEvent,
        deck: &mut Deck,
        store: &mut DeckStore<S>,
        now: u32,
    ) -> Result<Handled, StoreError<S::Error>> {
        if let Some(index) = self.current_index() {
            if deck.get(index).is_none() {
                self.enter_error(ErrorReason::MissingCard(index));
                return Ok(Handled::Consumed);
            }
        }

        let Some(target) = self.state.on_event(event) else {
            return Ok(Handled::Ignored);
        };

        match event {
            ReviewEvent::Reveal => {
                if self.current_index().is_none() {
                    return Ok(Handled::Ignored);
                }
            }
            ReviewEvent::Grade(grade) => {
                let Some(index) = self.current_index() else {
                    return Ok(Handled::Ignored);
                };
                let Some(card) = deck.get(index) else {
                    self.enter_error(ErrorReason::MissingCard(index));
                    return Ok(Handled::Consumed);
                };
                let previous = card.state;
                let graded = previous.graded(grade, now);
                store.commit(deck, index, graded)?;
                log::debug!(
                    "Review: card {} {:?} {:?} -> {:?} due {}",
                    index,
                    grade,
                    previous.leitner_box,
                    graded.leitner_box,
                    graded.due_at
                );
                self.reviewed = self.reviewed.saturating_add(1);
                self.refresh.record_review();
                // Start after the graded card so an Incorrect card due now
                // comes back only once the rest of the due cards were seen.
                self.selection = next_due_after(deck.cards(), now, index + 1);
            }
            ReviewEvent::CardDataInvalid => {
                self.enter_error(ErrorReason::Reported);
                return Ok(Handled::Consumed);
            }
            ReviewEvent::Recover => {
                self.error = None;
                self.selection = next_due(deck.cards(), now);
                self.refresh.request_full();
            }
            ReviewEvent::RequestInfo | ReviewEvent::Dismiss => {}
        }

        self.state = target;
        Ok(Handled::Consumed)
    }

    fn enter_error(&mut self, reason: ErrorReason) {
        log::warn!("Review: {} -> ERROR: {}", self.state.label(), reason);
        self.state = ReviewState::Error;
        self.error = Some(reason);
        self.refresh.request_full();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Grade;
    use crate::memory_store::MemoryStore;
    use crate::scheduler::{CardState, LeitnerBox};
    use crate::store::Namespace;

    const ALL_STATES: [ReviewState; 4] = [
        ReviewState::Recto,
        ReviewState::Verso,
        ReviewState::Info,
        ReviewState::Error,
    ];

    const ALL_EVENTS: [ReviewEvent; 7] = [
        ReviewEvent::Reveal,
        ReviewEvent::Grade(Grade::Correct),
        ReviewEvent::Grade(Grade::Incorrect),
        ReviewEvent::RequestInfo,
        ReviewEvent::Dismiss,
        ReviewEvent::CardDataInvalid,
        ReviewEvent::Recover,
    ];

    fn setup(text: &str) -> (Deck, DeckStore<MemoryStore>) {
        let (deck, _) = Deck::import(text);
        (deck, DeckStore::new(MemoryStore::new(), Namespace::default()))
    }

    #[test]
    fn transition_table() {
        use ReviewEvent as E;
        use ReviewState as S;
        assert_eq!(S::Recto.on_event(E::Reveal), Some(S::Verso));
        assert_eq!(S::Verso.on_event(E::Grade(Grade::Correct)), Some(S::Recto));
        assert_eq!(S::Verso.on_event(E::Grade(Grade::Incorrect)), Some(S::Recto));
        assert_eq!(S::Recto.on_event(E::RequestInfo), Some(S::Info));
        assert_eq!(S::Verso.on_event(E::RequestInfo), Some(S::Info));
        assert_eq!(S::Info.on_event(E::Dismiss), Some(S::Recto));
        assert_eq!(S::Error.on_event(E::Recover), Some(S::Recto));
        assert_eq!(S::Recto.on_event(E::Grade(Grade::Correct)), None);
        assert_eq!(S::Info.on_event(E::Reveal), None);
        assert_eq!(S::Verso.on_event(E::Recover), None);
    }

    #[test]
    fn error_reachable_from_every_state() {
        for state in ALL_STATES {
            assert_eq!(
                state.on_event(ReviewEvent::CardDataInvalid),
                Some(ReviewState::Error)
            );
        }
    }

    #[test]
    fn error_has_single_exit_to_recto() {
        let exits: alloc::vec::Vec<_> = ALL_EVENTS
            .iter()
            .filter_map(|&event| ReviewState::Error.on_event(event))
            .filter(|&target| target != ReviewState::Error)
            .collect();
        assert_eq!(exits, [ReviewState::Recto]);
    }

    #[test]
    fn reveal_grade_cycle_persists() {
        let (mut deck, mut store) = setup("1;café;coffee\n2;naïve;naive");
        let mut session = ReviewSession::new(&deck, 1000);
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(session.current_index(), Some(0));

        let handled = session
            .handle(ReviewEvent::Reveal, &mut deck, &mut store, 1000)
            .unwrap();
        assert_eq!(handled, Handled::Consumed);
        assert_eq!(session.state(), ReviewState::Verso);

        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 1000)
            .unwrap();
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(session.reviewed(), 1);
        assert_eq!(
            deck.get(0).unwrap().state,
            CardState::new(LeitnerBox::Ok, 1001)
        );
        assert_eq!(
            store.read(0).unwrap(),
            Some(CardState::new(LeitnerBox::Ok, 1001))
        );
    }

    #[test]
    fn incorrect_card_comes_back_after_the_rest() {
        let (mut deck, mut store) = setup("1;a;A\n2;b;B");
        let mut session = ReviewSession::new(&deck, 10);

        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 10).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Incorrect), &mut deck, &mut store, 10)
            .unwrap();
        assert_eq!(session.current_index(), Some(1));

        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 10).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 10)
            .unwrap();
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn info_and_dismiss_return_to_front() {
        let (mut deck, mut store) = setup("1;a;A");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        session
            .handle(ReviewEvent::RequestInfo, &mut deck, &mut store, 0)
            .unwrap();
        assert_eq!(session.state(), ReviewState::Info);
        assert_eq!(session.current_index(), Some(0));

        let ignored = session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 0)
            .unwrap();
        assert_eq!(ignored, Handled::Ignored);

        session.handle(ReviewEvent::Dismiss, &mut deck, &mut store, 0).unwrap();
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(deck.get(0).unwrap().state, CardState::default());
    }

    #[test]
    fn recover_restarts_selection_from_deck_start() {
        let (mut deck, mut store) = setup("1;a;A\n2;b;B\n3;c;C");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Incorrect), &mut deck, &mut store, 0)
            .unwrap();
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        assert_eq!(session.current_index(), Some(1));

        session
            .handle(ReviewEvent::CardDataInvalid, &mut deck, &mut store, 0)
            .unwrap();
        assert_eq!(session.state(), ReviewState::Error);
        assert_eq!(session.error(), Some(ErrorReason::Reported));
        assert_eq!(session.current_index(), None);

        for event in ALL_EVENTS {
            if matches!(event, ReviewEvent::Recover | ReviewEvent::CardDataInvalid) {
                continue;
            }
            let handled = session.handle(event, &mut deck, &mut store, 0).unwrap();
            assert_eq!(handled, Handled::Ignored);
            assert_eq!(session.state(), ReviewState::Error);
        }

        session.handle(ReviewEvent::Recover, &mut deck, &mut store, 0).unwrap();
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn corrupted_load_starts_in_error() {
        let (deck, _) = setup("1;a;A");
        let err = CorruptionError::BadLength {
            len: 3,
            expected: None,
        };
        let session =
            ReviewSession::start(&deck, 0, LoadOutcome::Reset(err), &StudyConfig::default());
        assert_eq!(session.state(), ReviewState::Error);
        assert_eq!(session.error(), Some(ErrorReason::Corrupted(err)));
    }

    #[test]
    fn missing_card_drives_error() {
        let (mut deck, mut store) = setup("1;a;A\n2;b;B");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 0)
            .unwrap();
        assert_eq!(session.current_index(), Some(1));

        let (mut shorter, _) = Deck::import("1;a;A");
        session
            .handle(ReviewEvent::Reveal, &mut shorter, &mut store, 0)
            .unwrap();
        assert_eq!(session.state(), ReviewState::Error);
        assert_eq!(session.error(), Some(ErrorReason::MissingCard(1)));
    }

    #[test]
    fn empty_deck_and_nothing_due_placeholders() {
        let (mut deck, mut store) = setup("");
        let mut session = ReviewSession::new(&deck, 0);
        assert_eq!(session.selection(), Selection::Empty);
        assert_eq!(
            session
                .handle(ReviewEvent::Reveal, &mut deck, &mut store, 0)
                .unwrap(),
            Handled::Ignored
        );

        let (mut deck, mut store) = setup("1;a;A");
        deck.set_state(0, CardState::new(LeitnerBox::Ok, 5));
        let mut session = ReviewSession::new(&deck, 4);
        assert_eq!(session.selection(), Selection::NoCardsDue);
        assert!(!session.poll(&deck, 4));
        assert!(session.poll(&deck, 5));
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 5).unwrap();
        assert_eq!(session.state(), ReviewState::Verso);
    }

    #[test]
    fn failed_grade_write_keeps_verso() {
        let (mut deck, mut store) = setup("1;a;A");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();

        store.backend_mut().fail_writes(true);
        let result = session.handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 0);
        assert!(result.is_err());
        assert_eq!(session.state(), ReviewState::Verso);
        assert_eq!(session.reviewed(), 0);
        assert_eq!(deck.get(0).unwrap().state, CardState::default());
        assert_eq!(store.read(0).unwrap(), None);
    }

    #[test]
    fn full_refresh_after_threshold_reviews() {
        let (mut deck, mut store) = setup("1;a;A");
        let config = StudyConfig::builder().full_refresh_threshold(2).build().unwrap();
        let mut session =
            ReviewSession::start(&deck, 0, LoadOutcome::Loaded { restored: 0 }, &config);
        assert_eq!(session.refresh_mode(), RefreshMode::Full);

        for expected in [RefreshMode::Fast, RefreshMode::Full] {
            session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
            session
                .handle(ReviewEvent::Grade(Grade::Incorrect), &mut deck, &mut store, 0)
                .unwrap();
            assert_eq!(session.refresh_mode(), expected);
        }
    }

    #[test]
    fn restart_selects_first_due() {
        let (mut deck, mut store) = setup("1;a;A\n2;b;B");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 0)
            .unwrap();
        assert_eq!(session.current_index(), Some(1));
        session.refresh_mode();

        store.reset(&mut deck, 0).unwrap();
        session.restart(&deck, 0);
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.refresh_mode(), RefreshMode::Full);
    }

    #[test]
    fn restart_keeps_error_until_recover() {
        let (mut deck, mut store) = setup("1;a;A\n2;b;B");
        let mut session = ReviewSession::new(&deck, 0);
        session.handle(ReviewEvent::Reveal, &mut deck, &mut store, 0).unwrap();
        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 0)
            .unwrap();
        session.report_invalid(ErrorReason::Reported);
        session.refresh_mode();

        store.reset(&mut deck, 0).unwrap();
        session.restart(&deck, 0);
        assert_eq!(session.state(), ReviewState::Error);
        assert_eq!(session.error(), Some(ErrorReason::Reported));
        assert_eq!(session.refresh_mode(), RefreshMode::Full);

        session.handle(ReviewEvent::Recover, &mut deck, &mut store, 0).unwrap();
        assert_eq!(session.state(), ReviewState::Recto);
        assert_eq!(session.error(), None);
        assert_eq!(session.current_index(), Some(0));
    }
}
