use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, InputMode, LANDING_MENU};
use crate::screen::Screen;
use crate::state::{ChatRole, TranscriptEntry};

/// Turn `**bold**` spans of a message line into styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else { break };

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        if len > 0 {
            spans.push(Span::styled(
                after_open[..len].to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after_open[len + 2..];
    }

    // Unclosed markers are kept as literal text
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Some(Screen::Landing) => render_landing_screen(app, frame, body_area),
        Some(Screen::Chat) => render_chat_screen(app, frame, body_area),
        Some(Screen::Ticket) => render_ticket_screen(app, frame, body_area),
        None => {}
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let screen_title = app.screen().map(|s| s.title()).unwrap_or("");

    let title = Line::from(vec![
        Span::styled(" Transit Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(screen_title, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen() {
        Some(screen) => format!(" {} ", screen.id()),
        None => " … ".to_string(),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = Vec::new();
    match (app.screen(), app.input_mode) {
        (Some(_), InputMode::Editing) => {
            hints.extend(hint("Enter", "send"));
            hints.extend(hint("Esc", "stop typing"));
        }
        (Some(Screen::Landing), InputMode::Normal) => {
            hints.extend(hint("j/k", "nav"));
            hints.extend(hint("Enter", "select"));
            hints.extend(hint("→", "chat"));
        }
        (Some(Screen::Chat), InputMode::Normal) => {
            if app.chat.pass_offer_visible() {
                hints.extend(hint("Enter", "use pass"));
                hints.extend(hint("→", "ticket"));
            } else {
                hints.extend(hint("i", "type"));
            }
            hints.extend(hint("j/k", "scroll"));
            hints.extend(hint("Esc", "back"));
        }
        (Some(Screen::Ticket), InputMode::Normal) => {
            hints.extend(hint("←", "chat"));
            hints.extend(hint("Esc", "back"));
        }
        (None, _) => {}
    }
    if app.input_mode == InputMode::Normal && app.screen().is_some() {
        hints.extend(hint("1-3", "jump"));
        hints.extend(hint("q", "quit"));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_landing_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [welcome_area, menu_area, status_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let welcome = Paragraph::new(Text::from(vec![
        Line::from(Span::styled("Where are you going today?", Style::default().fg(Color::Cyan).bold())),
        Line::from(Span::styled(
            "Plan a trip with the assistant and travel on your pass.",
            Style::default().fg(Color::DarkGray),
        )),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(welcome, welcome_area);

    let items: Vec<ListItem> = LANDING_MENU
        .iter()
        .map(|(label, _)| ListItem::new(format!(" {} ", label)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Menu "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, menu_area, &mut app.landing_state);

    if let Some(status) = &app.status {
        let status = Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, status_area);
    }
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let offer_height = if app.chat.pass_offer_visible() { 3 } else { 0 };

    let [chat_area, offer_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(offer_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing
    app.chat_area = Some(chat_area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(" Trip Assistant ");

    let chat_text = if app.chat.transcript().is_empty() {
        Text::from(Span::styled(
            "Ask where you want to go...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for entry in app.chat.transcript().entries() {
            match entry {
                TranscriptEntry::Message(msg) => {
                    let (label, color) = match msg.role {
                        ChatRole::User => ("You:", Color::Cyan),
                        ChatRole::Assistant => ("AI:", Color::Yellow),
                    };
                    lines.push(Line::from(Span::styled(
                        label,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
                TranscriptEntry::Map(map) => {
                    lines.push(Line::from(Span::styled(
                        format!("🗺  Map: {}", map.label),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(Span::styled(
                        map.url.clone(),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED),
                    )));
                }
            }
            lines.push(Line::default());
        }

        if app.chat.is_replying() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat(((app.tick_count / 3) % 3) as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // Wrapped height is measured at the final width, so the offset always
    // matches what is drawn even after the pass offer shrinks the view.
    let inner = chat_block.inner(chat_area);
    let chat = Paragraph::new(chat_text).wrap(Wrap { trim: true });
    let total = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(inner.height);
    app.chat_scroll = if app.chat_follow {
        max_scroll
    } else {
        app.chat_scroll.min(max_scroll)
    };

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    if app.chat.pass_offer_visible() {
        let offer = Paragraph::new(Line::from(vec![
            Span::styled(" 🎫 Use my valid pass ", Style::default().fg(Color::Black).bg(Color::Green).bold()),
            Span::styled("  press Enter", Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
        frame.render_widget(offer, offer_area);
    }

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Message (i to type) ");

    // Horizontal scroll keeps the cursor visible inside the borders
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_ticket_screen(app: &App, frame: &mut Frame, area: Rect) {
    let card_width = 44.min(area.width);
    let card_height = 10.min(area.height);
    let card_area = Rect::new(
        area.x + (area.width.saturating_sub(card_width)) / 2,
        area.y + (area.height.saturating_sub(card_height)) / 2,
        card_width,
        card_height,
    );

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(Span::styled("TRAVEL PASS", Style::default().fg(Color::Green).bold())),
        Line::default(),
        Line::from(vec![
            Span::styled("From  ", label),
            Span::raw("Ajman Beach Stop"),
        ]),
        Line::from(vec![
            Span::styled("To    ", label),
            Span::raw("City Center Stop"),
        ]),
        Line::from(vec![
            Span::styled("Route ", label),
            Span::raw("Bus ADX"),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("Valid until ", label),
            Span::styled(app.ticket.valid_until_label(), Style::default().fg(Color::Yellow).bold()),
        ]),
    ];

    let card = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green))
                .title(" My Ticket "),
        );

    frame.render_widget(card, card_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::{Duration, Instant};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_bold_markers_become_styled_spans() {
        let line = parse_markdown_line("take **Bus ADX** now");
        let texts: Vec<_> = line.spans.iter().map(|s| s.content.to_string()).collect();

        assert_eq!(texts, vec!["take ", "Bus ADX", " now"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_marker_stays_literal() {
        let line = parse_markdown_line("a **b");
        let texts: Vec<_> = line.spans.iter().map(|s| s.content.to_string()).collect();

        assert_eq!(texts, vec!["a **b"]);
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn chat_app() -> (App, Instant) {
        let t0 = Instant::now();
        let mut app = App::new(&Config::new(), t0);
        app.tick(t0 + ms(100));
        app.show_screen(2).unwrap();
        (app, t0 + ms(100))
    }

    #[test]
    fn test_follow_up_stays_visible_when_pass_offer_appears() {
        let (mut app, t) = chat_app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        app.chat_input = "trip?".to_string();
        app.send_message(t);
        for step in [2000, 3500, 4000] {
            app.tick(t + ms(step));
            terminal.draw(|frame| render(&mut app, frame)).unwrap();
        }

        assert!(app.chat.pass_offer_visible());
        let text = screen_text(&terminal);
        assert!(text.contains("Use my valid pass"));
        assert!(text.contains("Would you like"));
    }

    #[test]
    fn test_manual_scroll_is_kept_and_clamped() {
        let (mut app, t) = chat_app();
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        app.chat_input = "trip?".to_string();
        app.send_message(t);
        app.tick(t + ms(3500));
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let bottom = app.chat_scroll;
        assert!(bottom > 0);

        app.scroll_chat_up(1);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert_eq!(app.chat_scroll, bottom - 1);

        app.scroll_chat_down(100);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert_eq!(app.chat_scroll, bottom);
        assert!(!app.chat_follow);
    }

    #[test]
    fn test_very_long_message_renders() {
        let (mut app, t) = chat_app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        app.chat_input = "x\n".repeat(70_000);
        app.send_message(t);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // Offset saturates instead of wrapping around to the top
        assert!(app.chat_scroll > u16::MAX - 100);
    }

    #[test]
    fn test_ticket_screen_shows_validity_date() {
        let t0 = Instant::now();
        let mut app = App::new(&Config::new(), t0);
        app.tick(t0 + Duration::from_millis(100));
        app.show_screen(3).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("TRAVEL PASS"));
        assert!(text.contains(&app.ticket.valid_until_label()));
    }
}
