//! Review input abstraction.
//!
//! Physical buttons and serial commands are translated into these events by
//! the firmware; the engine only sees `ReviewEvent`s.

/// Self-assessment of a revealed card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Correct,
    Incorrect,
}

/// Events driving the review state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    /// Show the back of the current card
    Reveal,
    /// Grade the revealed card and move on
    Grade(Grade),
    /// Show card and deck metadata
    RequestInfo,
    /// Leave the info screen
    Dismiss,
    /// Card data was found to be invalid or corrupted
    CardDataInvalid,
    /// Leave the error screen
    Recover,
}

impl ReviewEvent {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewEvent::Reveal => "reveal",
            ReviewEvent::Grade(Grade::Correct) => "grade-correct",
            ReviewEvent::Grade(Grade::Incorrect) => "grade-incorrect",
            ReviewEvent::RequestInfo => "request-info",
            ReviewEvent::Dismiss => "dismiss",
            ReviewEvent::CardDataInvalid => "card-data-invalid",
            ReviewEvent::Recover => "recover",
        }
    }
}
