// Keyboard and paste handling for the TUI.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::sequence::Direction;
use crate::tui::types::{App, TuiMsg};

use super::async_ops::{spawn_commentary_request, spawn_images_request};

const COMMENTARY_PAGE: u16 = 5;

pub fn handle_event(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(tx, app, key),
        Event::Paste(text) => app.editor.insert_str(&text),
        _ => {}
    }
}

fn handle_key(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if ctrl => app.should_quit = true,

        KeyCode::F(5) => request_commentary(tx, app),
        KeyCode::Char('r') if ctrl => request_commentary(tx, app),
        KeyCode::F(6) => request_images(tx, app),
        KeyCode::Char('g') if ctrl => request_images(tx, app),
        KeyCode::F(7) => navigate(app, Direction::Previous),
        KeyCode::Left if ctrl => navigate(app, Direction::Previous),
        KeyCode::F(8) => navigate(app, Direction::Next),
        KeyCode::Right if ctrl => navigate(app, Direction::Next),
        KeyCode::F(9) => clear_commentary(app),

        KeyCode::PageUp => {
            app.commentary_scroll = app.commentary_scroll.saturating_sub(COMMENTARY_PAGE);
        }
        KeyCode::PageDown => {
            app.commentary_scroll = app.commentary_scroll.saturating_add(COMMENTARY_PAGE);
        }

        KeyCode::Enter => app.editor.insert_char('\n'),
        KeyCode::Tab => app.editor.insert_str("    "),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Delete => app.editor.delete(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Home => app.editor.home(),
        KeyCode::End => app.editor.end(),
        KeyCode::Char('l') if ctrl => app.editor.clear(),
        KeyCode::Char(c) if !ctrl => app.editor.insert_char(c),
        _ => {}
    }
}

fn request_commentary(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App) {
    if app.commentary_pending {
        app.status = "Commentary request already running.".to_string();
        return;
    }

    let script = app.editor.script();
    app.commentary_pending = true;
    app.commentary_scroll = 0;
    if !script.is_blank() {
        app.commentary = "Fetching commentary...".to_string();
        app.status = "Loading commentary, please wait...".to_string();
    }
    spawn_commentary_request(app.requester.clone(), tx.clone(), script);
}

fn request_images(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App) {
    if app.images_pending {
        app.status = "Image request already running.".to_string();
        return;
    }

    let script = app.editor.script();
    app.visuals.clear();
    app.picture = None;
    app.images_pending = true;
    if !script.is_blank() {
        app.status = "Generating images, please wait...".to_string();
    }
    spawn_images_request(
        app.visuals.generator().clone(),
        app.visuals.settings().clone(),
        tx.clone(),
        script,
    );
}

fn navigate(app: &mut App, direction: Direction) {
    let shown = app.visuals.navigate(direction).map(|img| img.segment.title());
    app.status = match (shown, app.visuals.sequence().cursor()) {
        (Some(title), Some(idx)) => format!(
            "Still {}/{} · {title}",
            idx + 1,
            app.visuals.sequence().len()
        ),
        _ => "No stills yet. Press F6 to generate.".to_string(),
    };
}

fn clear_commentary(app: &mut App) {
    app.commentary.clear();
    app.commentary_scroll = 0;
    app.last_model = None;
    app.last_usage = None;
}
