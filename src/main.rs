use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;
mod handler;
mod scheduler;
mod screen;
mod sequencer;
mod state;
mod ticket;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::{EventHandler, Tui};

/// How often scheduled steps are checked
const TICK_RATE: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::new(), Some(err)),
    };

    init_logging(&config)?;
    if let Some(err) = config_error {
        warn!(%err, "could not read config, using defaults");
    }
    info!("transit-chat v{} starting", env!("CARGO_PKG_VERSION"));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(&config, Instant::now());
    let mut events = EventHandler::new(TICK_RATE);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("transit-chat exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else { break };
        handler::handle_event(app, event, Instant::now());
    }
    Ok(())
}

/// Log to a file: the terminal belongs to the UI
fn init_logging(config: &Config) -> Result<()> {
    let log_path = Config::log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
