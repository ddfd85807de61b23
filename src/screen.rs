use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::NavError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Chat,
    Ticket,
}

impl Screen {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Screen::Landing),
            2 => Some(Screen::Chat),
            3 => Some(Screen::Ticket),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Screen::Landing => 1,
            Screen::Chat => 2,
            Screen::Ticket => 3,
        }
    }

    /// The screen to the right, or itself at the end
    pub fn next(&self) -> Self {
        match self {
            Screen::Landing => Screen::Chat,
            Screen::Chat | Screen::Ticket => Screen::Ticket,
        }
    }

    /// The screen to the left, or itself at the start
    pub fn previous(&self) -> Self {
        match self {
            Screen::Landing | Screen::Chat => Screen::Landing,
            Screen::Ticket => Screen::Chat,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Landing => "Home",
            Screen::Chat => "Trip Assistant",
            Screen::Ticket => "My Ticket",
        }
    }
}

/// Tracks the single active screen
///
/// No screen is active until the startup delay has passed.
#[derive(Debug)]
pub struct ScreenController {
    active: Option<Screen>,
    startup_at: Option<Instant>,
}

impl ScreenController {
    pub fn new(now: Instant, startup_delay: Duration) -> Self {
        Self {
            active: None,
            startup_at: Some(now + startup_delay),
        }
    }

    pub fn active(&self) -> Option<Screen> {
        self.active
    }

    /// Returns true once, when the startup delay has elapsed and the initial
    /// screen should be shown.
    pub fn startup_due(&mut self, now: Instant) -> bool {
        match self.startup_at {
            Some(at) if at <= now => {
                self.startup_at = None;
                true
            }
            _ => false,
        }
    }

    /// Make `id` the only active screen. An unknown id leaves the current
    /// screen active.
    pub fn activate(&mut self, id: u8) -> Result<Screen, NavError> {
        let target = Screen::from_id(id).ok_or(NavError::ScreenNotFound(id))?;
        if let Some(previous) = self.active.replace(target) {
            debug!(from = previous.id(), to = target.id(), "screen switched");
        } else {
            debug!(to = target.id(), "initial screen shown");
        }
        Ok(target)
    }
}
