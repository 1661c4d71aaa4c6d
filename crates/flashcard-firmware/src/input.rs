//! Watchy buttons and their meaning on each review screen.

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use flashcard_core::{Grade, ReviewEvent, ReviewState};

/// Watchy v2 side buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Top left, also the deep sleep wakeup pin
    Menu,
    Back,
    Up,
    Down,
}

impl Button {
    /// GPIO number the button is wired to
    pub const fn gpio(self) -> i32 {
        match self {
            Button::Menu => 26,
            Button::Back => 25,
            Button::Up => 32,
            Button::Down => 4,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "menu" => Some(Button::Menu),
            "back" => Some(Button::Back),
            "up" => Some(Button::Up),
            "down" => Some(Button::Down),
            _ => None,
        }
    }
}

/// Review event for `button` on the screen of `state`, if it has one
pub fn event_for(button: Button, state: ReviewState) -> Option<ReviewEvent> {
    match (state, button) {
        (ReviewState::Recto, Button::Menu) => Some(ReviewEvent::Reveal),
        (ReviewState::Recto, Button::Back) => Some(ReviewEvent::RequestInfo),
        (ReviewState::Verso, Button::Up) => Some(ReviewEvent::Grade(Grade::Correct)),
        (ReviewState::Verso, Button::Down) => Some(ReviewEvent::Grade(Grade::Incorrect)),
        (ReviewState::Verso, Button::Back) => Some(ReviewEvent::RequestInfo),
        (ReviewState::Info, Button::Back | Button::Menu) => Some(ReviewEvent::Dismiss),
        (ReviewState::Error, Button::Menu) => Some(ReviewEvent::Recover),
        _ => None,
    }
}

/// Active high button inputs with edge detection
pub struct Buttons<'d> {
    pins: [(Button, PinDriver<'d, AnyIOPin, Input>); 4],
    held: Option<Button>,
}

impl<'d> Buttons<'d> {
    pub fn new(
        menu: AnyIOPin,
        back: AnyIOPin,
        up: AnyIOPin,
        down: AnyIOPin,
    ) -> Result<Self, EspError> {
        let input = |pin: AnyIOPin| -> Result<PinDriver<'d, AnyIOPin, Input>, EspError> {
            let mut driver = PinDriver::input(pin)?;
            driver.set_pull(Pull::Down)?;
            Ok(driver)
        };
        Ok(Self {
            pins: [
                (Button::Menu, input(menu)?),
                (Button::Back, input(back)?),
                (Button::Up, input(up)?),
                (Button::Down, input(down)?),
            ],
            held: None,
        })
    }

    /// Currently pressed button; Menu wins over Back, Up and Down
    pub fn pressed(&self) -> Option<Button> {
        self.pins
            .iter()
            .find(|(_, pin)| pin.is_high())
            .map(|(button, _)| *button)
    }

    /// Button that went down since the last poll
    pub fn poll(&mut self) -> Option<Button> {
        let pressed = self.pressed();
        let edge = match pressed {
            Some(button) if self.held != Some(button) => Some(button),
            _ => None,
        };
        self.held = pressed;
        edge
    }
}
