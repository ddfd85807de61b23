//! Terminal setup and the async event pump feeding the main loop

use std::io::{self, Stderr};
use std::time::{Duration, Instant};
use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Wheel scrolling only; clicks and drags never reach the app
    Mouse(MouseEvent),
    Resize,
    /// Carries the instant the timer fired, so scripted steps are judged
    /// against the tick rather than when the loop got to it
    Tick(Instant),
}

impl AppEvent {
    /// Map a terminal event to an app event, dropping what the app ignores
    fn from_terminal(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Mouse(mouse)
                if matches!(mouse.kind, MouseEventKind::ScrollUp | MouseEventKind::ScrollDown) =>
            {
                Some(AppEvent::Mouse(mouse))
            }
            Event::Resize(..) => Some(AppEvent::Resize),
            _ => None,
        }
    }
}

pub struct EventHandler {
    rx: UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// `tick_rate` bounds how late a scripted step can fire
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_input_reader(tx.clone());
        spawn_ticker(tx, tick_rate);
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

fn spawn_input_reader(tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(event) = reader.next().await {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(%err, "terminal event stream error");
                    continue;
                }
            };
            let Some(event) = AppEvent::from_terminal(event) else { continue };
            if tx.send(event).is_err() {
                break;
            }
        }
        debug!("input reader stopped");
    });
}

fn spawn_ticker(tx: UnboundedSender<AppEvent>, tick_rate: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        loop {
            let at = interval.tick().await.into_std();
            if tx.send(AppEvent::Tick(at)).is_err() {
                break;
            }
        }
    });
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers, MouseButton};

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_only_key_presses_pass_through() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let mut release = press;
        release.kind = KeyEventKind::Release;

        assert!(matches!(
            AppEvent::from_terminal(Event::Key(press)),
            Some(AppEvent::Key(k)) if k.code == KeyCode::Char('a')
        ));
        assert!(AppEvent::from_terminal(Event::Key(release)).is_none());
    }

    #[test]
    fn test_only_wheel_mouse_events_pass_through() {
        assert!(matches!(
            AppEvent::from_terminal(mouse(MouseEventKind::ScrollUp)),
            Some(AppEvent::Mouse(_))
        ));
        assert!(AppEvent::from_terminal(mouse(MouseEventKind::Moved)).is_none());
        assert!(AppEvent::from_terminal(mouse(MouseEventKind::Down(MouseButton::Left))).is_none());
    }

    #[test]
    fn test_resize_and_focus() {
        assert!(matches!(
            AppEvent::from_terminal(Event::Resize(80, 24)),
            Some(AppEvent::Resize)
        ));
        assert!(AppEvent::from_terminal(Event::FocusGained).is_none());
    }

    #[tokio::test]
    async fn test_ticker_sends_increasing_instants() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_ticker(tx, Duration::from_millis(5));

        let Some(AppEvent::Tick(first)) = rx.recv().await else { panic!("expected tick") };
        let Some(AppEvent::Tick(second)) = rx.recv().await else { panic!("expected tick") };
        assert!(second > first);
    }
}
