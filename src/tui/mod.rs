pub mod app;
pub mod config_screen;
pub mod dashboard;

use crate::config::Config;
use crate::events::{EventSink, UiEvent};
use crate::http::UreqTransport;
use crate::pipeline;
use app::{yes_no, App, FieldKind, RunState, Screen};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::cell::RefCell;
use std::io;
use std::time::Duration;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Run the full TUI application.
pub fn run() -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let result = main_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn main_loop(terminal: &mut Term, app: &mut App) -> Result<()> {
    loop {
        // Render
        terminal.draw(|f| match app.screen {
            Screen::Config => config_screen::render(f, app),
            Screen::Dashboard => dashboard::render(f, app),
        })?;

        // Poll for input events (50ms timeout for ~20fps)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events, not release/repeat (avoids double-input on Windows)
                if key.kind != event::KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C always quits
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }

                match app.screen {
                    Screen::Config => {
                        if let Some(config) = handle_config_key(app, key) {
                            run_pipeline(terminal, app, config);
                        }
                    }
                    Screen::Dashboard => handle_dashboard_key(app, key),
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

// ── Inline run ──────────────────────────────────────────────────────────────

/// Feeds events into the dashboard and redraws after each one, so the run
/// stays on the UI thread.
struct DrawSink<'a> {
    app: RefCell<&'a mut App>,
    terminal: RefCell<&'a mut Term>,
}

impl EventSink for DrawSink<'_> {
    fn send(&self, event: UiEvent) {
        let mut app = self.app.borrow_mut();
        app.handle_event(event);
        let app: &App = &app;
        if let Err(e) = self.terminal.borrow_mut().draw(|f| dashboard::render(f, app)) {
            log::debug!("dashboard redraw failed: {}", e);
        }
    }
}

fn run_pipeline(terminal: &mut Term, app: &mut App, config: Config) {
    app.reset_run();
    app.screen = Screen::Dashboard;
    app.run_state = RunState::Running;
    app.range_label = config.range.to_string();

    let transport = UreqTransport::new();
    let sink = DrawSink {
        app: RefCell::new(app),
        terminal: RefCell::new(terminal),
    };
    pipeline::run_with(&config, &transport, &sink);
}

// ── Config screen key handling ──────────────────────────────────────────────

/// Returns a validated config when the user starts a run.
fn handle_config_key(app: &mut App, key: event::KeyEvent) -> Option<Config> {
    if app.editing {
        let value = &mut app.fields[app.selected].value;
        let cursor = app.edit_cursor.min(value.len());
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                app.editing = false;
            }
            KeyCode::Char(c) => {
                value.insert(cursor, c);
                app.edit_cursor = cursor + c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some((prev, _)) = value[..cursor].char_indices().next_back() {
                    value.remove(prev);
                    app.edit_cursor = prev;
                }
            }
            KeyCode::Delete => {
                if cursor < value.len() {
                    value.remove(cursor);
                }
            }
            KeyCode::Left => {
                if let Some((prev, _)) = value[..cursor].char_indices().next_back() {
                    app.edit_cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = value[cursor..].chars().next() {
                    app.edit_cursor = cursor + c.len_utf8();
                }
            }
            KeyCode::Home => app.edit_cursor = 0,
            KeyCode::End => app.edit_cursor = value.len(),
            _ => {}
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up => {
            if app.selected > 0 {
                app.selected -= 1;
            }
        }
        KeyCode::Down => {
            if app.selected < app.total_items() - 1 {
                app.selected += 1;
            }
        }
        KeyCode::Tab => {
            app.selected = (app.selected + 1) % app.total_items();
        }
        KeyCode::BackTab => {
            if app.selected == 0 {
                app.selected = app.total_items() - 1;
            } else {
                app.selected -= 1;
            }
        }
        KeyCode::Enter => {
            if app.is_on_start_button() {
                return try_build(app);
            }
            let field = &mut app.fields[app.selected];
            match field.kind {
                FieldKind::Toggle => field.value = yes_no(!field.is_on()).into(),
                FieldKind::Text => {
                    app.editing = true;
                    app.edit_cursor = field.value.len();
                }
            }
        }
        KeyCode::F(5) => return try_build(app),
        _ => {}
    }
    None
}

fn try_build(app: &mut App) -> Option<Config> {
    match app.build_config() {
        Ok(config) => {
            app.validation_error = None;
            Some(config)
        }
        Err(err) => {
            app.validation_error = Some(err);
            None
        }
    }
}

// ── Dashboard key handling ──────────────────────────────────────────────────

fn handle_dashboard_key(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('b') => {
            if app.run_state != RunState::Running {
                app.reset_run();
                app.screen = Screen::Config;
            }
        }
        KeyCode::Up => {
            if app.log_scroll > 0 {
                app.log_scroll -= 1;
            }
        }
        KeyCode::Down => {
            if app.log_scroll < app.logs.len().saturating_sub(1) {
                app.log_scroll += 1;
            }
        }
        KeyCode::PageUp => {
            app.log_scroll = app.log_scroll.saturating_sub(10);
        }
        KeyCode::PageDown => {
            app.log_scroll = (app.log_scroll + 10).min(app.logs.len().saturating_sub(1));
        }
        _ => {}
    }
}
