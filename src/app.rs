use std::time::Instant;
use chrono::Local;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::NavError;
use crate::screen::{Screen, ScreenController};
use crate::sequencer::ChatSequencer;
use crate::ticket::Ticket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,  // Chat input has focus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingAction {
    PlanTrip,
    ComingSoon(&'static str),
}

/// Items on the landing screen menu
pub const LANDING_MENU: &[(&str, LandingAction)] = &[
    ("Plan a trip with AI", LandingAction::PlanTrip),
    ("Buy a ticket", LandingAction::ComingSoon("Buy a ticket")),
    ("Top up card", LandingAction::ComingSoon("Top up card")),
    ("Nearby stops", LandingAction::ComingSoon("Nearby stops")),
];

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub screens: ScreenController,
    pub chat: ChatSequencer,
    pub ticket: Ticket,

    // Landing state
    pub landing_state: ListState,
    pub status: Option<String>,

    // Chat input and transcript view
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_scroll: u16,
    pub chat_follow: bool,  // Keep the newest entry in view; resolved at render time
    pub chat_area: Option<Rect>,

    // Animation state
    pub tick_count: u64,
}

impl App {
    pub fn new(config: &Config, now: Instant) -> Self {
        let timings = config.timings();

        let mut landing_state = ListState::default();
        landing_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            screens: ScreenController::new(now, timings.startup),
            chat: ChatSequencer::new(timings, config.map_url()),
            ticket: Ticket::default(),

            landing_state,
            status: None,

            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_follow: true,
            chat_area: None,

            tick_count: 0,
        }
    }

    pub fn screen(&self) -> Option<Screen> {
        self.screens.active()
    }

    /// Activate a screen by id and run its setup. Unknown ids are logged and
    /// leave the current screen in place.
    pub fn show_screen(&mut self, id: u8) -> Result<Screen, NavError> {
        let screen = match self.screens.activate(id) {
            Ok(screen) => screen,
            Err(err) => {
                error!(%err, "ignoring screen change");
                return Err(err);
            }
        };

        self.status = None;
        self.input_mode = InputMode::Normal;

        match screen {
            Screen::Landing => {}
            Screen::Chat => {
                self.chat.reset();
                self.chat_scroll = 0;
                self.chat_follow = true;
            }
            Screen::Ticket => {
                self.ticket.refresh(Local::now().date_naive());
                debug!(valid_until = %self.ticket.valid_until_label(), "ticket refreshed");
            }
        }

        debug!(active = screen.id(), "currently active screen");
        Ok(screen)
    }

    /// Move one screen right. Leaving the chat needs the pass offer on screen.
    pub fn go_next(&mut self) {
        let Some(current) = self.screen() else { return };
        match current {
            Screen::Landing => {
                let _ = self.show_screen(current.next().id());
            }
            Screen::Chat if self.chat.pass_offer_visible() => {
                let _ = self.show_screen(current.next().id());
            }
            Screen::Chat => debug!("pass offer not shown yet, staying on chat"),
            Screen::Ticket => {}
        }
    }

    /// Move one screen left
    pub fn go_back(&mut self) {
        let Some(current) = self.screen() else { return };
        if current != Screen::Landing {
            let _ = self.show_screen(current.previous().id());
        }
    }

    /// Accept the pass offer, if it is showing
    pub fn use_pass(&mut self) -> bool {
        if self.screen() == Some(Screen::Chat) && self.chat.pass_offer_visible() {
            let _ = self.show_screen(Screen::Ticket.id());
            true
        } else {
            false
        }
    }

    /// Send the typed message. Blank input is left in the field untouched.
    pub fn send_message(&mut self, now: Instant) -> bool {
        if !self.chat.submit(&self.chat_input, now) {
            return false;
        }
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.scroll_chat_to_bottom();
        true
    }

    /// Drive startup and scripted steps (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        self.tick_count = self.tick_count.wrapping_add(1);

        if self.screens.startup_due(now) {
            info!("startup delay elapsed");
            let _ = self.show_screen(Screen::Landing.id());
        }

        if self.chat.poll(now) {
            self.scroll_chat_to_bottom();
        }
    }

    // Landing menu
    pub fn landing_nav_down(&mut self) {
        let i = match self.landing_state.selected() {
            Some(i) if i + 1 < LANDING_MENU.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.landing_state.select(Some(i));
    }

    pub fn landing_nav_up(&mut self) {
        let i = self.landing_state.selected().unwrap_or(0).saturating_sub(1);
        self.landing_state.select(Some(i));
    }

    pub fn select_landing_item(&mut self) {
        let Some(i) = self.landing_state.selected() else { return };
        let Some(&(_, action)) = LANDING_MENU.get(i) else { return };

        match action {
            LandingAction::PlanTrip => {
                let _ = self.show_screen(Screen::Chat.id());
            }
            LandingAction::ComingSoon(feature) => {
                info!(feature, "feature not available yet");
                self.status = Some(format!("{} feature coming soon!", feature));
            }
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_follow = false;
        self.chat_scroll = 0;
    }

    /// Pin the transcript to its newest entry. The offset itself depends on
    /// the layout, so the renderer computes it.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_follow = true;
    }
}
