//! Terminal front-end for the viewer.

use std::io;
use std::path::Path;

use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};
use tracing::info;

use photo_core::{Result, ViewerConfig};
use photo_store::PhotoStore;

use crate::state::{Action, ViewerState};

/// Run the viewer until the user quits.
///
/// Starts at photo `start` (clamped). Returns immediately for an empty
/// catalogue. Once raw mode is on, the terminal is restored on every exit
/// path, including a failure to set up the screen.
pub fn run(store: &mut PhotoStore, root: &Path, start: usize, config: &ViewerConfig) -> Result<()> {
    let mut state = ViewerState::new(store, start, config.max_suggestions);
    if state.is_finished() {
        info!("Catalogue is empty; nothing to show");
        return Ok(());
    }

    enable_raw_mode()?;
    restoring(|| run_on_alternate_screen(store, root, &mut state), restore_terminal)
}

fn run_on_alternate_screen(store: &mut PhotoStore, root: &Path, state: &mut ViewerState) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    event_loop(&mut terminal, store, root, state)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

/// Run `body`, then `restore` whatever happened. The body's error wins.
fn restoring<T>(body: impl FnOnce() -> Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    let result = body();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    store: &mut PhotoStore,
    root: &Path,
    state: &mut ViewerState,
) -> Result<()> {
    while !state.is_finished() {
        terminal.draw(|frame| draw(frame, store, root, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = map_key(key) {
                state.apply(store, action);
            }
        }
    }
    Ok(())
}

/// Key bindings.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('d') if ctrl => Some(Action::ToggleDone),
        KeyCode::Char('s') if ctrl => Some(Action::ToggleStarred),
        KeyCode::Char('x') if ctrl => Some(Action::RemoveLastTag),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(Action::Input(c)),
        KeyCode::Left => Some(Action::Prev),
        KeyCode::Right => Some(Action::Next),
        KeyCode::Tab => Some(Action::NextPending),
        KeyCode::Enter => Some(Action::Accept),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Delete => Some(Action::RemoveLastTag),
        _ => None,
    }
}

/// Draw one frame.
pub fn draw(frame: &mut Frame, store: &PhotoStore, root: &Path, state: &ViewerState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[0]);

    let Some(photo) = state.current(store) else {
        return;
    };

    let flag = |on: bool, label: &'static str| {
        if on {
            Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };
    let info = vec![
        Line::from(photo.display_path(root).display().to_string()),
        Line::from(Span::styled(
            photo.digest().to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(vec![
            flag(photo.is_done(), "done"),
            Span::raw("  "),
            flag(photo.is_starred(), "starred"),
        ]),
    ];
    let title = format!(" Photo {}/{} ", state.index() + 1, store.photo_count());
    frame.render_widget(
        Paragraph::new(info).block(Block::default().borders(Borders::ALL).title(title)),
        columns[0],
    );

    let tags: Vec<ListItem> = state
        .current_tags(store)
        .into_iter()
        .map(|name| ListItem::new(name.to_string()).style(Style::default().fg(Color::Red)))
        .collect();
    frame.render_widget(
        List::new(tags).block(Block::default().borders(Borders::ALL).title(" Tags ")),
        columns[1],
    );

    let mut input = vec![Span::raw(state.typed().to_string())];
    if let Some(completion) = state.completion(store) {
        if completion != state.typed() {
            input.push(Span::styled(
                format!("  -> {}", completion),
                Style::default().fg(Color::Blue),
            ));
        }
    }
    frame.render_widget(
        Paragraph::new(Line::from(input)).block(Block::default().borders(Borders::ALL).title(" Tag ")),
        rows[1],
    );

    let hint = match state.status() {
        Some(status) => status.to_string(),
        None => state.suggestions(store).join("  "),
    };
    frame.render_widget(Paragraph::new(hint), rows[2]);

    frame.render_widget(
        Paragraph::new(
            "Left/Right move  Tab next untagged  Enter tag  Del untag  ^D done  ^S star  Esc quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );
}
