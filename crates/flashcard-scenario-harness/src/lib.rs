//! Host-side scenario test harness for scripted review flows.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use embedded_graphics::prelude::*;
use flashcard_core::{
    encode, record_key, CardState, Deck, DeckStore, Grade, Handled, KeyValueStore, MemoryStore,
    MemoryStoreError, Namespace, RefreshMode, ReviewEvent, ReviewState, Screen, StoreError,
    StudyApp, StudyConfig, Surface, TestDisplay,
};
use png::{BitDepth, ColorType, Encoder};

/// Day number used when a scenario does not pick one
pub const DEFAULT_TODAY: u32 = 19_000;

/// Surface that renders into a [`TestDisplay`] and remembers what it showed.
pub struct RecordingSurface {
    display: TestDisplay,
    text_width: u32,
    screens: Vec<String>,
    refreshes: Vec<RefreshMode>,
}

impl RecordingSurface {
    pub fn new(text_width: u16) -> Self {
        Self {
            display: TestDisplay::default_size(),
            text_width: u32::from(text_width),
            screens: Vec::new(),
            refreshes: Vec::new(),
        }
    }

    pub fn display(&self) -> &TestDisplay {
        &self.display
    }

    /// Body text of every screen shown, oldest first
    pub fn screens(&self) -> &[String] {
        &self.screens
    }

    pub fn refreshes(&self) -> &[RefreshMode] {
        &self.refreshes
    }
}

impl Surface for RecordingSurface {
    type Error = core::convert::Infallible;

    fn show(&mut self, screen: &Screen<'_>) -> Result<(), Self::Error> {
        self.screens.push(screen.to_string());
        flashcard_core::render(screen, &mut self.display, self.text_width)
    }

    fn draw(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        self.refreshes.push(mode);
        Ok(())
    }
}

type HarnessApp = StudyApp<MemoryStore, RecordingSurface>;

/// Couples a study app, an in-memory store, a recording display and a
/// settable day clock for scenario tests.
pub struct ScenarioHarness {
    cards: String,
    config: StudyConfig,
    today: u32,
    app: HarnessApp,
}

impl ScenarioHarness {
    /// Fresh deck with no saved progress, starting on [`DEFAULT_TODAY`].
    pub fn new(cards: &str) -> Self {
        Self::with_backend(cards, MemoryStore::new(), DEFAULT_TODAY)
    }

    /// Deck over an existing backend, as after a reboot.
    pub fn with_backend(cards: &str, backend: MemoryStore, today: u32) -> Self {
        Self::with_config(cards, backend, today, StudyConfig::default())
    }

    pub fn with_config(cards: &str, backend: MemoryStore, today: u32, config: StudyConfig) -> Self {
        let (deck, _) = Deck::import(cards);
        let store = DeckStore::new(backend, config.namespace.clone());
        let surface = RecordingSurface::new(config.max_text_width);
        let app = StudyApp::start(deck, store, surface, config.clone(), today)
            .expect("memory store load should succeed");
        Self {
            cards: cards.to_string(),
            config,
            today,
            app,
        }
    }

    /// Deck whose cards already carry `states` in the store, in deck order.
    pub fn with_progress(cards: &str, states: &[CardState], today: u32) -> Self {
        let namespace = StudyConfig::default().namespace;
        let mut backend = MemoryStore::new();
        for (index, state) in states.iter().enumerate() {
            backend
                .set(
                    &namespace,
                    &record_key(index),
                    &encode(state.leitner_box, state.due_at),
                )
                .expect("seeding the memory store should succeed");
        }
        Self::with_backend(cards, backend, today)
    }

    /// Simulate a power cycle: the deck is re-imported and progress is
    /// loaded back from the store.
    pub fn reboot(self) -> Self {
        let (_, store, _) = self.app.into_parts();
        Self::with_config(&self.cards, store.into_inner(), self.today, self.config)
    }

    /// Tear down the app, keeping only what was persisted.
    pub fn into_backend(self) -> MemoryStore {
        let (_, store, _) = self.app.into_parts();
        store.into_inner()
    }

    /// Send an event, returning the store error if a grade could not be saved.
    pub fn try_send(&mut self, event: ReviewEvent) -> Result<Handled, StoreError<MemoryStoreError>> {
        self.app.dispatch(event, self.today)
    }

    /// Send an event that must not fail to persist.
    pub fn send(&mut self, event: ReviewEvent) -> Handled {
        self.try_send(event).expect("scenario event should persist")
    }

    /// Reveal the current card and grade it.
    pub fn review(&mut self, grade: Grade) {
        assert_eq!(self.send(ReviewEvent::Reveal), Handled::Consumed);
        assert_eq!(self.send(ReviewEvent::Grade(grade)), Handled::Consumed);
    }

    /// Move the clock forward and let the app look for newly due cards.
    ///
    /// Returns true if a card is on screen afterwards.
    pub fn advance_days(&mut self, days: u32) -> bool {
        self.today += days;
        self.app.tick(self.today);
        self.app.session().current_index().is_some()
    }

    /// Draw the current screen if anything changed.
    pub fn render(&mut self) -> bool {
        if !self.app.needs_redraw() {
            return false;
        }
        self.app
            .redraw(self.today)
            .expect("scenario render should succeed");
        true
    }

    pub fn today(&self) -> u32 {
        self.today
    }

    pub fn state(&self) -> ReviewState {
        self.app.session().state()
    }

    /// Body text of the current screen
    pub fn screen_text(&self) -> String {
        self.app.screen(self.today).to_string()
    }

    /// Front of the card under review
    pub fn current_front(&self) -> Option<&str> {
        self.app
            .session()
            .current_card(self.app.deck())
            .map(|card| card.front.as_str())
    }

    pub fn card_state(&self, index: usize) -> Option<CardState> {
        self.app.deck().get(index).map(|card| card.state)
    }

    /// Access the app for assertions.
    pub fn app(&self) -> &HarnessApp {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut HarnessApp {
        &mut self.app
    }

    pub fn backend(&self) -> &MemoryStore {
        self.app.store().backend()
    }

    /// Access the store backend for fault injection.
    pub fn backend_mut(&mut self) -> &mut MemoryStore {
        self.app.store_mut().backend_mut()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.config.namespace
    }

    pub fn surface(&self) -> &RecordingSurface {
        self.app.surface()
    }

    /// Access the display for render assertions.
    pub fn display(&self) -> &TestDisplay {
        self.app.surface().display()
    }

    /// Save the current framebuffer to a PNG (white = Off, black = On).
    pub fn save_screenshot_png(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let display = self.display();
        let Size { width, height } = display.size();
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(if display.is_black(x, y) { 0u8 } else { 255u8 });
            }
        }

        let file = File::create(path).map_err(|e| e.to_string())?;
        let writer = BufWriter::new(file);
        let mut encoder = Encoder::new(writer, width, height);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::Eight);
        let mut png_writer = encoder.write_header().map_err(|e| e.to_string())?;
        png_writer
            .write_image_data(&data)
            .map_err(|e| e.to_string())?;
        log::info!("Saved screenshot {}", path.display());
        Ok(())
    }
}
