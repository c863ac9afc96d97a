use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use archchat_core::{ChatRole, SearchPhase};
use crate::app::{App, InputMode, Screen};

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

    match app.screen {
        Screen::Search => render_search_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn ellipsis(app: &App) -> &'static str {
    match app.animation_frame {
        0 => ".",
        1 => "..",
        _ => "...",
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Address Search ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}] {} ", app.environment.as_str(), app.api_url),
            Style::default().fg(Color::Gray),
        ),
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

    let mode_text = match app.screen {
        Screen::Search => " SEARCH ",
        Screen::Chat => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let keys: &[(&str, &str)] = match (app.screen, app.input_mode) {
        (_, InputMode::Editing) => &[("Enter", "send"), ("Esc", "done"), ("Tab", "switch")],
        (Screen::Search, InputMode::Normal) => {
            &[("i", "edit"), ("d", "download"), ("Tab", "chat"), ("q", "quit")]
        }
        (Screen::Chat, InputMode::Normal) => &[
            ("i", "edit"),
            ("j/k", "scroll"),
            ("d", "download"),
            ("Tab", "search"),
            ("q", "quit"),
        ],
    };
    for (key, label) in keys {
        hints.push(Span::styled(format!(" {key} "), key_style));
        hints.push(Span::styled(format!(" {label} "), label_style));
    }

    if let Some(status) = &app.status {
        hints.push(Span::raw("  "));
        hints.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Draw a single-line input box, scrolled horizontally to keep the cursor visible
fn render_input(app: &App, frame: &mut Frame, area: Rect, title: &str) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app
        .input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_search_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, status_area, viewer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    render_input(app, frame, input_area, " Address ");

    let status_line = match app.search.phase() {
        SearchPhase::Idle => Line::from(Span::styled(
            "Type an address and press Enter",
            Style::default().fg(Color::DarkGray),
        )),
        SearchPhase::Loading => Line::from(Span::styled(
            format!("Searching{}", ellipsis(app)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )),
        SearchPhase::Success => match app.search.pptx_path() {
            Some(_) => Line::from(Span::styled("Presentation ready", Style::default().fg(Color::Green))),
            None => Line::from(Span::styled(
                "Search finished, no document was generated",
                Style::default().fg(Color::DarkGray),
            )),
        },
        SearchPhase::Failure => Line::from(Span::styled(
            app.search.error().unwrap_or_default(),
            Style::default().fg(Color::Red),
        )),
    };

    let status = Paragraph::new(status_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Status "),
    );
    frame.render_widget(status, status_area);

    render_viewer(app, frame, viewer_area);
}

fn render_viewer(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Document ");

    let text = match (app.viewer.src(), app.viewer.kind()) {
        (Some(src), Some(kind)) => Text::from(vec![
            Line::from(Span::styled(kind.display_name(), Style::default().bold())),
            Line::default(),
            Line::from(vec![
                Span::styled("Source: ", Style::default().fg(Color::DarkGray)),
                Span::styled(src.as_str().to_string(), Style::default().fg(Color::Cyan)),
            ]),
            Line::default(),
            Line::from(Span::styled(
                format!("Press d to save into {}", app.download_dir.display()),
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        _ => Text::from(Span::styled("No document", Style::default().fg(Color::DarkGray))),
    };

    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat_text = if app.chat.messages().is_empty() && !app.chat.is_waiting() {
        Text::from(Span::styled(
            "Send an address to get its presentation...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.chat.messages() {
            let (label, color) = match msg.role {
                ChatRole::User => ("You:", Color::Cyan),
                ChatRole::Assistant => ("Bot:", Color::Green),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            lines.extend(msg.text.lines().map(|line| Line::from(line.to_string())));
            lines.push(Line::default());
        }

        if app.chat.is_waiting() {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("Searching{}", ellipsis(app)),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area, " Address ");
}
