use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, MenuItem};
use crate::config::ColorConfig;

const MENU_WIDTH: u16 = 54;

/// One menu row: label on the left, optional value on the right.
fn menu_row(label: &str, value: &str, selected: bool, colors: &ColorConfig) -> Line<'static> {
    let inner = MENU_WIDTH as usize - 4;
    let gap = inner
        .saturating_sub(4 + label.chars().count() + value.chars().count())
        .max(1);

    if selected {
        let bg = ColorConfig::to_color(&colors.menu_selected_bg);
        let fg = Color::Rgb(0, 255, 255);
        Line::from(vec![
            Span::styled("  ▸ ", Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)),
            Span::styled(label.to_string(), Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)),
            Span::styled(" ".repeat(gap), Style::default().bg(bg)),
            Span::styled(value.to_string(), Style::default().fg(Color::Rgb(150, 150, 170)).bg(bg)),
        ])
    } else {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(label.to_string(), Style::default().fg(Color::Rgb(140, 140, 160))),
            Span::raw(" ".repeat(gap)),
            Span::styled(value.to_string(), Style::default().fg(Color::Rgb(100, 100, 120))),
        ])
    }
}

fn key_hint(key: &str, label: &str, color: Color) -> [Span<'static>; 2] {
    [
        Span::styled(key.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {}  ", label), Style::default().fg(Color::Rgb(100, 100, 120))),
    ]
}

/// Rows of the open menu or submenu, and the menu title.
fn menu_rows(app: &App, colors: &ColorConfig) -> (String, Vec<Line<'static>>) {
    let current = app.selected_menu_item();

    if app.menu.in_submenu {
        match current {
            Some(MenuItem::DataSource) => {
                let rows = app
                    .source_choices()
                    .iter()
                    .enumerate()
                    .map(|(i, id)| {
                        let mark = if *id == app.selected_source { "✓" } else { "" };
                        menu_row(app.sources.label_for(id), mark, i == app.menu.submenu_selected, colors)
                    })
                    .collect();
                return (" Data Source ".to_string(), rows);
            }
            Some(MenuItem::Model) => {
                let rows = app
                    .models
                    .iter()
                    .enumerate()
                    .map(|(i, model)| {
                        let mark = if *model == app.selected_model { "✓" } else { "" };
                        menu_row(model, mark, i == app.menu.submenu_selected, colors)
                    })
                    .collect();
                return (" Model ".to_string(), rows);
            }
            _ => {}
        }
    }

    let rows = App::menu_items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let value = match item {
                MenuItem::DataSource => app.sources.label_for(&app.selected_source).to_string(),
                MenuItem::Model => app.selected_model.clone(),
                MenuItem::ExportTranscript | MenuItem::Exit => String::new(),
            };
            menu_row(item.label(), &value, i == app.menu.selected, colors)
        })
        .collect();
    (" Settings ".to_string(), rows)
}

/// Render the popup menu overlay with modal effect.
pub fn render_menu(f: &mut Frame, app: &App, colors: &ColorConfig) {
    let area = f.size();
    let (title, rows) = menu_rows(app, colors);

    let menu_height = (rows.len() as u16 + 6).min(area.height);
    let menu_width = MENU_WIDTH.min(area.width);
    let menu_x = (area.width.saturating_sub(menu_width)) / 2;
    let menu_y = (area.height.saturating_sub(menu_height)) / 2;

    // Shadow layer (offset by 2,1)
    let shadow_area = Rect {
        x: (menu_x + 2).min(area.width.saturating_sub(menu_width)),
        y: (menu_y + 1).min(area.height.saturating_sub(menu_height)),
        width: menu_width,
        height: menu_height,
    };
    f.render_widget(
        Block::default().style(Style::default().bg(Color::Rgb(10, 10, 15))),
        shadow_area,
    );

    let menu_area = Rect {
        x: menu_x,
        y: menu_y,
        width: menu_width,
        height: menu_height,
    };
    f.render_widget(Clear, menu_area);

    let mut lines = vec![Line::from("")];
    lines.extend(rows);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  ────────────────────────────────────────────────",
        Style::default().fg(Color::Rgb(60, 60, 80)),
    )));

    let back = if app.menu.in_submenu { "Back" } else { "Close" };
    let mut hints = vec![Span::raw("  ")];
    hints.extend(key_hint("↑↓", "Navigate", Color::Rgb(0, 255, 255)));
    hints.extend(key_hint("⏎", "Select", Color::Rgb(0, 255, 128)));
    hints.extend(key_hint("Esc", back, Color::Rgb(255, 100, 100)));
    lines.push(Line::from(hints));

    let menu_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(80, 80, 100)))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Rgb(0, 255, 255))
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(ColorConfig::to_color(&colors.menu_bg)));

    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Left).block(menu_block),
        menu_area,
    );
}
