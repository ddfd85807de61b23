use std::time::Instant;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::screen::Screen;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, now: Instant) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, now),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The next frame lays out again and re-clamps the chat offset
        AppEvent::Resize => {}
        AppEvent::Tick(at) => app.tick(at),
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Nothing is on screen until startup finishes
    let Some(screen) = app.screen() else { return };

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, screen, key),
        InputMode::Editing => handle_editing_mode(app, key, now),
    }
}

fn handle_normal_mode(app: &mut App, screen: Screen, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Screen navigation
        KeyCode::Left => app.go_back(),
        KeyCode::Right => app.go_next(),
        KeyCode::Esc => app.go_back(),
        KeyCode::Char(c @ '1'..='3') => {
            if let Some(id) = c.to_digit(10) {
                let _ = app.show_screen(id as u8);
            }
        }

        _ => match screen {
            Screen::Landing => handle_landing(app, key),
            Screen::Chat => handle_chat_normal(app, key),
            Screen::Ticket => {}
        },
    }
}

fn handle_landing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.landing_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.landing_nav_up(),
        KeyCode::Enter => app.select_landing_item(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Enter takes the pass when offered, otherwise starts typing
        KeyCode::Enter => {
            if !app.use_pass() {
                start_editing(app);
            }
        }
        KeyCode::Char('i') | KeyCode::Tab => start_editing(app),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.scroll_chat_to_top(),
        _ => {}
    }
}

fn start_editing(app: &mut App) {
    app.input_mode = InputMode::Editing;
    // Cursor at end of existing text
    app.chat_cursor = app.chat_input.chars().count();
}

fn handle_editing_mode(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if app.send_message(now) {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen() != Some(Screen::Chat) {
        return;
    }

    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}
