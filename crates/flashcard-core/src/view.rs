//! What the review screen shows, and drawing it.
//!
//! [`Screen`] is a plain description derived from the session; a [`Surface`]
//! (the e-paper framebuffer on the watch, a recorder in tests) displays it.
//! [`render`] draws a screen into any `BinaryColor` draw target.

use core::fmt;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, iso_8859_1::FONT_9X15, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use embedded_text::{
    alignment::{HorizontalAlignment, VerticalAlignment},
    style::TextBoxStyleBuilder,
    TextBox,
};

use crate::deck::Deck;
use crate::power::RefreshMode;
use crate::review::{ErrorReason, ReviewSession, ReviewState};
use crate::scheduler::{CardState, DeckStats, LeitnerBox, Selection};

const HEADER_HEIGHT: i32 = 16;
const MARGIN: i32 = 4;

/// Card metadata shown on the info screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoPage {
    /// Index and state of the card under review
    pub card: Option<(usize, CardState)>,
    pub stats: DeckStats,
    /// Grades completed this session
    pub reviewed: u32,
    pub today: u32,
}

/// Content of the review screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen<'a> {
    Front {
        text: &'a str,
        position: usize,
        total: usize,
    },
    Back {
        front: &'a str,
        back: &'a str,
    },
    Info(InfoPage),
    Error(Option<ErrorReason>),
    DeckEmpty,
    NothingDue,
}

impl<'a> Screen<'a> {
    /// Describe what `session` currently shows
    pub fn from_session(session: &ReviewSession, deck: &'a Deck, now: u32) -> Self {
        let card = session
            .current_index()
            .and_then(|index| deck.get(index).map(|card| (index, card)));

        match session.state() {
            ReviewState::Error => Screen::Error(session.error()),
            ReviewState::Info => Screen::Info(InfoPage {
                card: card.map(|(index, card)| (index, card.state)),
                stats: DeckStats::collect(deck.cards(), now),
                reviewed: session.reviewed(),
                today: now,
            }),
            ReviewState::Recto | ReviewState::Verso => match (card, session.selection()) {
                (Some((index, card)), _) if session.state() == ReviewState::Recto => {
                    Screen::Front {
                        text: &card.front,
                        position: index + 1,
                        total: deck.len(),
                    }
                }
                (Some((_, card)), _) => Screen::Back {
                    front: &card.front,
                    back: &card.back,
                },
                (None, Selection::Empty) => Screen::DeckEmpty,
                (None, _) => Screen::NothingDue,
            },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Front { .. } => "Question",
            Screen::Back { .. } => "Answer",
            Screen::Info(_) => "Info",
            Screen::Error(_) => "Error",
            Screen::DeckEmpty | Screen::NothingDue => "Flashcards",
        }
    }

    /// Button legend for the footer
    pub fn hint(&self) -> &'static str {
        match self {
            Screen::Front { .. } => "MENU reveal  BACK info",
            Screen::Back { .. } => "UP right  DOWN wrong",
            Screen::Info(_) => "BACK close",
            Screen::Error(_) => "MENU continue",
            Screen::DeckEmpty | Screen::NothingDue => "",
        }
    }
}

impl fmt::Display for Screen<'_> {
    /// Body text of the screen, without title or hint
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Front { text, .. } => f.write_str(text),
            Screen::Back { front, back } => write!(f, "{}\n\n{}", front, back),
            Screen::Info(page) => {
                if let Some((index, state)) = page.card {
                    writeln!(
                        f,
                        "Card {}/{}: {} box",
                        index + 1,
                        page.stats.total,
                        state.leitner_box.label()
                    )?;
                    writeln!(f, "Due day {} (today {})", state.due_at, page.today)?;
                }
                writeln!(f, "Due now: {}", page.stats.due)?;
                writeln!(
                    f,
                    "New {} / Ok {} / Good {}",
                    page.stats.in_box(LeitnerBox::New),
                    page.stats.in_box(LeitnerBox::Ok),
                    page.stats.in_box(LeitnerBox::Good)
                )?;
                write!(f, "Reviewed: {}", page.reviewed)
            }
            Screen::Error(Some(reason)) => write!(f, "{}", reason),
            Screen::Error(None) => f.write_str("Invalid card data"),
            Screen::DeckEmpty => f.write_str("Deck empty"),
            Screen::NothingDue => f.write_str("Nothing to review"),
        }
    }
}

/// Display collaborator for the review screen
pub trait Surface {
    type Error: fmt::Debug;

    /// Lay out `screen` without pushing it to the panel
    fn show(&mut self, screen: &Screen<'_>) -> Result<(), Self::Error>;

    /// Push the laid out screen to the panel
    fn draw(&mut self, mode: RefreshMode) -> Result<(), Self::Error>;
}

/// Draw `screen` into `display`, wrapping card text at `text_width` pixels.
pub fn render<D: DrawTarget<Color = BinaryColor>>(
    screen: &Screen<'_>,
    display: &mut D,
    text_width: u32,
) -> Result<(), D::Error> {
    let size = display.bounding_box().size;
    display.clear(BinaryColor::Off)?;

    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    Text::with_baseline(
        screen.title(),
        Point::new(MARGIN, MARGIN),
        small,
        Baseline::Top,
    )
    .draw(display)?;
    if let Screen::Front {
        position, total, ..
    } = screen
    {
        let counter = alloc::format!("{}/{}", position, total);
        let x = size.width as i32 - MARGIN - (counter.len() as i32 * 6);
        Text::with_baseline(&counter, Point::new(x, MARGIN), small, Baseline::Top)
            .draw(display)?;
    }
    Line::new(
        Point::new(0, HEADER_HEIGHT),
        Point::new(size.width as i32 - 1, HEADER_HEIGHT),
    )
    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
    .draw(display)?;

    let body = alloc::format!("{}", screen);
    let width = text_width.min(size.width);
    let left = (size.width.saturating_sub(width) / 2) as i32;
    let footer_top = size.height as i32 - HEADER_HEIGHT;
    let bounds = Rectangle::new(
        Point::new(left, HEADER_HEIGHT + MARGIN),
        Size::new(width, (footer_top - HEADER_HEIGHT - 2 * MARGIN).max(0) as u32),
    );
    let (alignment, character_style) = match screen {
        Screen::Info(_) => (
            HorizontalAlignment::Left,
            MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
        ),
        _ => (
            HorizontalAlignment::Center,
            MonoTextStyle::new(&FONT_9X15, BinaryColor::On),
        ),
    };
    let textbox_style = TextBoxStyleBuilder::new()
        .alignment(alignment)
        .vertical_alignment(VerticalAlignment::Middle)
        .build();
    TextBox::with_textbox_style(&body, bounds, character_style, textbox_style).draw(display)?;

    if !screen.hint().is_empty() {
        Text::with_baseline(
            screen.hint(),
            Point::new(MARGIN, footer_top + MARGIN),
            small,
            Baseline::Top,
        )
        .draw(display)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CorruptionError;
    use crate::input::{Grade, ReviewEvent};
    use crate::memory_store::MemoryStore;
    use crate::store::{DeckStore, Namespace};
    use crate::test_display::TestDisplay;
    use alloc::string::ToString;

    fn session_with(text: &str) -> (Deck, DeckStore<MemoryStore>, ReviewSession) {
        let (deck, _) = Deck::import(text);
        let session = ReviewSession::new(&deck, 1000);
        (
            deck,
            DeckStore::new(MemoryStore::new(), Namespace::default()),
            session,
        )
    }

    #[test]
    fn screens_follow_session_state() {
        let (mut deck, mut store, mut session) = session_with("1;café;coffee");
        assert_eq!(
            Screen::from_session(&session, &deck, 1000),
            Screen::Front {
                text: "café",
                position: 1,
                total: 1
            }
        );

        session
            .handle(ReviewEvent::Reveal, &mut deck, &mut store, 1000)
            .unwrap();
        assert_eq!(
            Screen::from_session(&session, &deck, 1000),
            Screen::Back {
                front: "café",
                back: "coffee"
            }
        );

        session
            .handle(ReviewEvent::Grade(Grade::Correct), &mut deck, &mut store, 1000)
            .unwrap();
        assert_eq!(
            Screen::from_session(&session, &deck, 1000),
            Screen::NothingDue
        );
    }

    #[test]
    fn empty_deck_screen() {
        let (deck, _, session) = session_with("");
        let screen = Screen::from_session(&session, &deck, 0);
        assert_eq!(screen, Screen::DeckEmpty);
        assert_eq!(screen.to_string(), "Deck empty");
    }

    #[test]
    fn info_text_lists_card_and_stats() {
        let (mut deck, mut store, mut session) = session_with("1;a;A\n2;b;B");
        session
            .handle(ReviewEvent::RequestInfo, &mut deck, &mut store, 1000)
            .unwrap();
        let text = Screen::from_session(&session, &deck, 1000).to_string();
        assert!(text.contains("Card 1/2: New box"));
        assert!(text.contains("Due now: 2"));
        assert!(text.contains("New 2 / Ok 0 / Good 0"));
        assert!(text.contains("Reviewed: 0"));
    }

    #[test]
    fn error_text_names_corruption() {
        let reason = ErrorReason::Corrupted(CorruptionError::BadLength {
            len: 3,
            expected: None,
        });
        let text = Screen::Error(Some(reason)).to_string();
        assert!(text.contains("3 bytes"));
        assert!(text.contains("reset"));
    }

    #[test]
    fn render_draws_every_screen() {
        let screens = [
            Screen::Front {
                text: "naïve 🎉",
                position: 3,
                total: 12,
            },
            Screen::Back {
                front: "café",
                back: "coffee",
            },
            Screen::Info(InfoPage {
                card: Some((0, CardState::default())),
                stats: DeckStats::default(),
                reviewed: 4,
                today: 1000,
            }),
            Screen::Error(None),
            Screen::DeckEmpty,
            Screen::NothingDue,
        ];
        for screen in screens {
            let mut display = TestDisplay::default_size();
            render(&screen, &mut display, u32::from(crate::MAX_TEXT_WIDTH)).unwrap();
            assert!(display.black_pixel_count() > 0, "{:?} drew nothing", screen);
        }
    }

    #[test]
    fn render_keeps_text_inside_width() {
        let mut display = TestDisplay::default_size();
        let screen = Screen::Front {
            text: "a fairly long question that has to wrap over several lines",
            position: 1,
            total: 1,
        };
        render(&screen, &mut display, 180).unwrap();
        let body_rows = HEADER_HEIGHT as u32 + 1..crate::DISPLAY_HEIGHT - HEADER_HEIGHT as u32;
        for y in body_rows {
            for x in (0..10).chain(190..200) {
                assert!(!display.is_black(x, y), "pixel ({x}, {y}) outside text box");
            }
        }
    }
}
