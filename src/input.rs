use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use tracing::error;

use crate::app::{App, MenuItem};
use crate::config::Config;
use crate::ui;

/// Result of handling a key event.
#[derive(Debug, PartialEq, Eq)]
pub enum HandleResult {
    /// Continue running the app
    Continue,
    /// Exit the app
    Exit,
}

/// Run the main application loop.
///
/// Must run inside a tokio runtime context so sends can spawn tasks.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, config: &Config) -> io::Result<()> {
    let behavior = &config.behavior;
    let blink = Duration::from_millis(behavior.cursor_blink_ms);
    let poll = Duration::from_millis(behavior.idle_poll_ms);
    let mut last_cursor_toggle = Instant::now();

    loop {
        // Pick up a finished reply before drawing
        app.process_reply();

        terminal.draw(|f| ui::ui(f, app, config))?;

        if last_cursor_toggle.elapsed() >= blink {
            app.toggle_cursor();
            last_cursor_toggle = Instant::now();
        }

        if event::poll(poll)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Reset cursor to visible on any keypress
                    app.cursor_visible = true;
                    last_cursor_toggle = Instant::now();

                    if handle_key_event(app, key.code, key.modifiers, config) == HandleResult::Exit {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Handle a key event and return whether to continue or exit.
pub fn handle_key_event(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    config: &Config,
) -> HandleResult {
    // Global shortcuts
    match code {
        KeyCode::Char('c') | KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            return HandleResult::Exit;
        }
        KeyCode::Char('p') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_menu();
            return HandleResult::Continue;
        }
        _ => {}
    }

    if app.menu.visible {
        if app.menu.in_submenu {
            handle_submenu_keys(app, code)
        } else {
            handle_main_menu_keys(app, code)
        }
    } else {
        handle_normal_keys(app, code, config.behavior.scroll_page_size)
    }
}

/// Handle key events in the main menu.
fn handle_main_menu_keys(app: &mut App, code: KeyCode) -> HandleResult {
    match code {
        KeyCode::Up => app.menu.up(),
        KeyCode::Down => app.menu.down(App::menu_items().len(), 0),
        KeyCode::Enter | KeyCode::Right => match app.selected_menu_item() {
            Some(item) if item.has_submenu() => {
                let current = app.submenu_current(item);
                app.menu.enter_submenu(current);
            }
            Some(MenuItem::ExportTranscript) => {
                app.menu.close();
                if let Err(err) = app.export_transcript() {
                    error!(error = %err, "transcript export failed");
                    app.notice = Some(format!("Export failed: {}", err));
                }
            }
            Some(MenuItem::Exit) => return HandleResult::Exit,
            _ => {}
        },
        KeyCode::Esc => app.menu.close(),
        _ => {}
    }
    HandleResult::Continue
}

/// Handle key events in a submenu (source or model selection).
fn handle_submenu_keys(app: &mut App, code: KeyCode) -> HandleResult {
    match code {
        KeyCode::Up => app.menu.up(),
        KeyCode::Down => {
            let count = app.selected_menu_item().map_or(0, |item| app.submenu_len(item));
            app.menu.down(0, count);
        }
        KeyCode::Enter => app.apply_submenu_selection(),
        KeyCode::Esc | KeyCode::Left => app.menu.exit_submenu(),
        _ => {}
    }
    HandleResult::Continue
}

/// Handle key events in normal (non-menu) mode.
fn handle_normal_keys(app: &mut App, code: KeyCode, page_size: usize) -> HandleResult {
    match code {
        KeyCode::Enter => app.submit_message(),
        KeyCode::Char(c) => app.handle_char(c),
        KeyCode::Backspace => app.handle_backspace(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Up => app.scroll.scroll_up(),
        KeyCode::Down => app.scroll.scroll_down(),
        KeyCode::PageUp => app.scroll.scroll_page_up(page_size),
        KeyCode::PageDown => app.scroll.scroll_page_down(page_size),
        KeyCode::Home => app.scroll.scroll_to_top(),
        KeyCode::End => app.scroll.scroll_to_bottom(),
        KeyCode::Esc => return HandleResult::Exit,
        _ => {}
    }
    HandleResult::Continue
}
