use ratatui::{
    layout::{Constraint, Direction, Layout, Margin},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
    Frame,
};

use crate::app::{App, ConnectionStatus};
use crate::config::{ColorConfig, Config};
use crate::message::Role;
use crate::transcript::render_messages;

use super::gradient::{gradient_block_with_status, gradient_color};
use super::menu::render_menu;
use super::text::{html_to_lines, wrap_line, Palette};

/// Hint shown before the first message.
const EMPTY_HINT: &str = "Ask Eugene about local government, services and data. Ctrl+P opens the menu.";

/// Build the chat area lines for every visible message.
pub fn chat_lines(app: &App, colors: &ColorConfig) -> Vec<Line<'static>> {
    let assistant = Palette::assistant(colors);
    let user = Palette {
        text: ColorConfig::to_color(&colors.user),
        ..assistant
    };

    let mut lines = Vec::new();
    for message in render_messages(&app.conversation) {
        let (palette, label_color) = match message.role {
            Role::User => (user, user.text),
            Role::Assistant | Role::System => (assistant, assistant.heading),
        };

        lines.push(Line::from(Span::styled(
            message.role.label().to_string(),
            Style::default().fg(label_color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(html_to_lines(&message.html, &palette));
        lines.push(Line::from(""));
    }

    if app.is_sending() {
        lines.push(Line::from(Span::styled(
            "Eugene is typing…".to_string(),
            Style::default()
                .fg(ColorConfig::to_color(&colors.status_sending))
                .add_modifier(Modifier::ITALIC),
        )));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            EMPTY_HINT.to_string(),
            Style::default().fg(Color::Rgb(140, 140, 160)),
        )));
    }

    lines
}

/// Main UI rendering function.
pub fn ui(f: &mut Frame, app: &mut App, config: &Config) {
    let colors = &config.colors;
    let (chat_start, chat_end) = colors.chat_gradient();
    let (input_start, input_end) = colors.input_gradient();

    let border_color = Color::Black;
    let bg_color = Color::Rgb(20, 20, 25);

    // Fill entire background with border color to create thick border effect
    let background = Block::default().style(Style::default().bg(border_color));
    f.render_widget(background, f.size());

    // Inner area with margin to create thick border (2 chars on sides, 1 on top/bottom)
    let inner_area = f.size().inner(&Margin {
        horizontal: 2,
        vertical: 1,
    });

    let inner_bg = Block::default().style(Style::default().bg(bg_color));
    f.render_widget(inner_bg, inner_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Chat messages
            Constraint::Length(3), // Input box
            Constraint::Length(1), // Footer
        ])
        .split(inner_area);

    // Borders on both sides plus one column for the scrollbar
    let text_width = chunks[0].width.saturating_sub(3) as usize;
    let viewport = chunks[0].height.saturating_sub(2) as usize;

    let lines: Vec<Line<'static>> = chat_lines(app, colors)
        .iter()
        .flat_map(|line| wrap_line(line, text_width))
        .collect();
    app.scroll.update(lines.len(), viewport);

    let status_color = match &app.llm.status {
        ConnectionStatus::Ready => ColorConfig::to_color(&colors.status_ready),
        ConnectionStatus::Sending => ColorConfig::to_color(&colors.status_sending),
        ConnectionStatus::NotConfigured | ConnectionStatus::Error(_) => {
            ColorConfig::to_color(&colors.status_error)
        }
    };

    let chat = Paragraph::new(lines)
        .block(gradient_block_with_status(
            " Eugene ",
            app.status_text(),
            status_color,
            chat_start,
            chat_end,
        ))
        .scroll((app.scroll.offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(chat, chunks[0]);

    let scroll_position = if app.scroll.max > 0 {
        app.scroll.offset as f32 / app.scroll.max as f32
    } else {
        1.0
    };
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("▲"))
        .end_symbol(Some("▼"))
        .track_symbol(Some("░"))
        .thumb_symbol("█")
        .style(Style::default().fg(gradient_color(chat_start, chat_end, scroll_position)));
    f.render_stateful_widget(
        scrollbar,
        chunks[0].inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut app.scroll.scrollbar,
    );

    render_input(f, app, chunks[1], gradient_color(input_start, input_end, 0.5));
    render_footer(f, app, chunks[2]);

    if app.menu.visible {
        render_menu(f, app, colors);
    }
}

/// Input box with a blinking cursor; dimmed while a reply is pending.
fn render_input(f: &mut Frame, app: &App, area: ratatui::layout::Rect, accent: Color) {
    let input_block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(Color::Rgb(30, 30, 35)));

    let input_text = if app.is_input_enabled() {
        let cursor_char = if app.cursor_visible { "▎" } else { " " };
        let cursor_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::SLOW_BLINK);
        let (before, after) = app.input.split_at_cursor();
        Line::from(vec![
            Span::raw(before.to_string()),
            Span::styled(cursor_char, cursor_style),
            Span::raw(after.to_string()),
        ])
    } else {
        Line::from(Span::styled(
            "Waiting for Eugene…",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
    };

    let input = Paragraph::new(input_text)
        .style(Style::default().fg(Color::White))
        .block(input_block)
        .wrap(Wrap { trim: false });
    f.render_widget(input, area);
}

/// One-line footer: source, model and the latest notice.
fn render_footer(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let dim = Style::default().fg(Color::Rgb(100, 100, 120));
    let value = Style::default().fg(Color::Rgb(180, 180, 200));

    let mut spans = vec![
        Span::styled(" Source: ", dim),
        Span::styled(app.sources.label_for(&app.selected_source).to_string(), value),
        Span::styled("  Model: ", dim),
        Span::styled(app.selected_model.clone(), value),
    ];
    match &app.llm.status {
        ConnectionStatus::Error(message) => {
            spans.push(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Rgb(255, 100, 100)),
            ));
        }
        _ => {
            if let Some(notice) = &app.notice {
                spans.push(Span::styled(format!("  {}", notice), dim));
            }
        }
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 25))),
        area,
    );
}
