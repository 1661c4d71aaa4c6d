//! Study application: deck, store, review session and display wired together.
//!
//! Firmware and host tools feed events in and call [`StudyApp::redraw`] when
//! [`StudyApp::needs_redraw`] says so. Display failures are returned to the
//! caller; the session state is already updated by then.

use alloc::vec::Vec;

use crate::config::StudyConfig;
use crate::deck::Deck;
use crate::input::ReviewEvent;
use crate::review::{Handled, ReviewSession};
use crate::scheduler::DeckStats;
use crate::store::{DeckStore, KeyValueStore, LoadOutcome, StoreError};
use crate::view::{Screen, Surface};

/// Application state for one deck
pub struct StudyApp<S: KeyValueStore, F: Surface> {
    deck: Deck,
    store: DeckStore<S>,
    session: ReviewSession,
    surface: F,
    config: StudyConfig,
    needs_redraw: bool,
}

impl<S: KeyValueStore, F: Surface> StudyApp<S, F> {
    /// Load persisted progress into `deck` and open a session on it.
    ///
    /// Corrupt progress does not fail startup: the deck is reset and the
    /// session opens on the error screen.
    pub fn start(
        mut deck: Deck,
        mut store: DeckStore<S>,
        surface: F,
        config: StudyConfig,
        today: u32,
    ) -> Result<Self, StoreError<S::Error>> {
        let load = store.load(&mut deck, today)?;
        match load {
            LoadOutcome::Loaded { restored } => log::info!(
                "App: {} cards, {} with saved progress, namespace {}",
                deck.len(),
                restored,
                store.namespace()
            ),
            LoadOutcome::Reset(_) => log::warn!("App: progress reset on load"),
        }
        let session = ReviewSession::start(&deck, today, load, &config);
        Ok(Self {
            deck,
            store,
            session,
            surface,
            config,
            needs_redraw: true,
        })
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn store(&self) -> &DeckStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DeckStore<S> {
        &mut self.store
    }

    pub fn surface(&self) -> &F {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut F {
        &mut self.surface
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn screen(&self, today: u32) -> Screen<'_> {
        Screen::from_session(&self.session, &self.deck, today)
    }

    pub fn stats(&self, today: u32) -> DeckStats {
        DeckStats::collect(self.deck.cards(), today)
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Feed one event to the session.
    pub fn dispatch(
        &mut self,
        event: ReviewEvent,
        today: u32,
    ) -> Result<Handled, StoreError<S::Error>> {
        let handled = self
            .session
            .handle(event, &mut self.deck, &mut self.store, today)?;
        if handled == Handled::Consumed {
            log::info!("App: {} -> {}", event.label(), self.session.state().label());
            self.needs_redraw = true;
        }
        Ok(handled)
    }

    /// Periodic check for cards that became due while idle.
    ///
    /// Returns true when a redraw is pending.
    pub fn tick(&mut self, today: u32) -> bool {
        if self.session.poll(&self.deck, today) {
            log::info!("App: a card became due");
            self.needs_redraw = true;
        }
        self.needs_redraw
    }

    /// Lay out and draw the current screen
    pub fn redraw(&mut self, today: u32) -> Result<(), F::Error> {
        let mode = self.session.refresh_mode();
        let screen = Screen::from_session(&self.session, &self.deck, today);
        self.surface.show(&screen)?;
        self.surface.draw(mode)?;
        self.needs_redraw = false;
        Ok(())
    }

    /// Snapshot of every card's state, in deck order
    pub fn export(&self) -> Vec<u8> {
        self.store.export(&self.deck)
    }

    /// Replace all progress with a snapshot and restart the session.
    ///
    /// An error screen stays until [`ReviewEvent::Recover`].
    pub fn restore(&mut self, blob: &[u8], today: u32) -> Result<(), StoreError<S::Error>> {
        self.store.restore(&mut self.deck, blob)?;
        self.session.restart(&self.deck, today);
        self.needs_redraw = true;
        Ok(())
    }

    /// Forget all progress and restart the session.
    pub fn reset(&mut self, today: u32) -> Result<(), StoreError<S::Error>> {
        self.store.reset(&mut self.deck, today)?;
        self.session.restart(&self.deck, today);
        self.needs_redraw = true;
        Ok(())
    }

    /// Give back deck, store and surface
    pub fn into_parts(self) -> (Deck, DeckStore<S>, F) {
        (self.deck, self.store, self.surface)
    }
}
