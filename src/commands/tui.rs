use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use crossterm::cursor::Show;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tracing::info;

use crate::app::Runtime;
use crate::commands::input::read_script_file;
use crate::errors::CliError;
use crate::tui::editor::ScriptEditor;
use crate::tui::handlers::{handle_event, handle_tui_msg};
use crate::tui::picture::PictureCache;
use crate::tui::types::{App, TuiMsg};

#[derive(Debug, Args)]
pub struct TuiArgs {
    /// Preload the script editor from a file
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, CliError> {
        enable_raw_mode()
            .map_err(|e| CliError::Generic(format!("Failed to enable raw mode: {e}")))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .map_err(|e| CliError::Generic(format!("Failed to enter alternate screen: {e}")))?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste, Show, LeaveAlternateScreen);
    }
}

pub async fn handle(runtime: &Runtime, args: TuiArgs) -> Result<(), CliError> {
    if runtime.output.json {
        return Err(CliError::Usage(
            "`--json` is not supported for `scriptreview tui`.".to_string(),
        ));
    }

    let editor = match &args.file {
        Some(path) => ScriptEditor::from_text(read_script_file(path)?.as_str()),
        None => ScriptEditor::default(),
    };

    let mut app = App::new(
        runtime.resolved_api_url()?,
        runtime.active_profile(),
        runtime.resolved_api_key().is_some(),
        editor,
        runtime.commentary()?,
        runtime.visuals()?,
    );
    info!(profile = %app.profile, api_url = %app.api_url, "starting tui");

    let guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| CliError::Generic(format!("Failed to init terminal: {e}")))?;
    terminal
        .clear()
        .map_err(|e| CliError::Generic(format!("Failed to clear terminal: {e}")))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<TuiMsg>();

    loop {
        update_spinner(&mut app);
        terminal
            .draw(|f| ui(f, &mut app))
            .map_err(|e| CliError::Generic(format!("Failed to draw: {e}")))?;

        if app.should_quit {
            break;
        }

        while let Ok(msg) = rx.try_recv() {
            handle_tui_msg(&mut app, msg);
        }

        // Redraw quickly only while a request is in flight.
        let poll_ms = if app.busy() { 50 } else { 120 };
        if crossterm::event::poll(Duration::from_millis(poll_ms))
            .map_err(|e| CliError::Generic(format!("Event poll failed: {e}")))?
        {
            let event = crossterm::event::read()
                .map_err(|e| CliError::Generic(format!("Event read failed: {e}")))?;
            handle_event(&tx, &mut app, event);
        }
    }

    terminal
        .show_cursor()
        .map_err(|e| CliError::Generic(format!("Failed to restore cursor: {e}")))?;
    drop(guard);
    info!("tui closed");
    Ok(())
}

fn ui(f: &mut Frame<'_>, app: &mut App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(4)])
        .split(size);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(cols[0]);

    render_script(f, app, left[0]);
    render_commentary(f, app, left[1]);
    render_stills(f, app, cols[1]);
    render_status(f, app, rows[1]);
}

fn pane(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(c_muted()))
}

fn render_script(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = pane(" Script ".to_string());
    let inner = block.inner(area);

    let (line, col) = app.editor.cursor_position();
    let line = u16::try_from(line).unwrap_or(u16::MAX);
    let col = u16::try_from(col).unwrap_or(u16::MAX);
    let scroll_y = line.saturating_sub(inner.height.saturating_sub(1));
    let scroll_x = col.saturating_sub(inner.width.saturating_sub(1));

    let text = if app.editor.is_empty() {
        Text::from(Line::styled(
            "Type or paste a movie script here.",
            Style::default().fg(c_muted()).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Text::from(app.editor.text())
    };

    f.render_widget(
        Paragraph::new(text).block(block).scroll((scroll_y, scroll_x)),
        area,
    );

    if inner.width > 0 && inner.height > 0 {
        f.set_cursor_position((
            inner.x + (col - scroll_x).min(inner.width - 1),
            inner.y + (line - scroll_y).min(inner.height - 1),
        ));
    }
}

fn render_commentary(f: &mut Frame<'_>, app: &App, area: Rect) {
    let title = if app.commentary_pending {
        " Commentary · loading ".to_string()
    } else {
        " Commentary ".to_string()
    };

    let body = Paragraph::new(app.commentary.clone())
        .block(pane(title))
        .style(Style::default().fg(c_commentary()).bg(Color::Black))
        .wrap(Wrap { trim: false })
        .scroll((app.commentary_scroll, 0));
    f.render_widget(body, area);
}

fn render_stills(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let seq = app.visuals.sequence();
    let title = match (app.visuals.current(), seq.cursor()) {
        (Some(img), Some(idx)) => format!(" Stills {}/{} · {} ", idx + 1, seq.len(), img.segment.title()),
        _ => " Stills ".to_string(),
    };
    let block = pane(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.images_pending {
        let frame = SPINNER_FRAMES[ping_pong_index(app.spinner_step, SPINNER_FRAMES.len())];
        let waiting = Paragraph::new(vec![
            Line::from(Span::styled(frame, Style::default().fg(c_commentary()))),
            Line::from(Span::styled(
                "Generating images, please wait...",
                Style::default().fg(c_muted()),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(waiting, centered_rows(inner, 2));
        return;
    }

    let Some(img) = app.visuals.current() else {
        let hint = Paragraph::new("No stills yet. Press F6 to generate.")
            .style(Style::default().fg(c_muted()))
            .alignment(Alignment::Center);
        f.render_widget(hint, centered_rows(inner, 1));
        return;
    };

    let stale = app
        .picture
        .as_ref()
        .is_none_or(|p| !p.matches(&img.source_url, inner.width, inner.height));
    if stale {
        app.picture = Some(PictureCache::build(
            &img.source_url,
            &img.bitmap,
            inner.width,
            inner.height,
        ));
    }

    if let Some(picture) = &app.picture {
        let height = u16::try_from(picture.lines.len()).unwrap_or(inner.height);
        let picture_area = centered_rows(inner, height);
        f.render_widget(
            Paragraph::new(picture.lines.clone()).alignment(Alignment::Center),
            picture_area,
        );
    }
}

fn render_status(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut first = Vec::new();
    if app.busy() {
        let frame = SPINNER_FRAMES[ping_pong_index(app.spinner_step, SPINNER_FRAMES.len())];
        first.push(Span::styled(
            format!("{frame} "),
            Style::default().fg(c_commentary()).add_modifier(Modifier::BOLD),
        ));
    }
    first.push(Span::raw(app.status.clone()));

    let key_span = if app.key_present {
        Span::styled("key: set", Style::default().fg(c_ok()))
    } else {
        Span::styled("key: missing", Style::default().fg(c_warn()))
    };
    let mut second = vec![
        Span::styled(format!("profile: {}", app.profile), Style::default().fg(c_muted())),
        Span::styled("  |  ", Style::default().fg(c_muted()).add_modifier(Modifier::DIM)),
        Span::styled(
            format!("model: {}", app.last_model.as_deref().unwrap_or(app.requester.model())),
            Style::default().fg(c_muted()),
        ),
        Span::styled("  |  ", Style::default().fg(c_muted()).add_modifier(Modifier::DIM)),
        key_span,
    ];
    if let Some(usage) = &app.last_usage {
        second.push(Span::styled("  |  ", Style::default().fg(c_muted()).add_modifier(Modifier::DIM)));
        second.push(Span::styled(usage.clone(), Style::default().fg(c_muted())));
    }

    let bar = Paragraph::new(vec![Line::from(first), Line::from(second)])
        .block(pane(format!(" {} ", app.api_url)))
        .style(Style::default().fg(Color::White));
    f.render_widget(bar, area);
}

fn centered_rows(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        x: area.x,
        y: area.y + (area.height - height) / 2,
        width: area.width,
        height,
    }
}

fn c_commentary() -> Color {
    // Deep pink; drawn on black.
    Color::Rgb(255, 20, 147)
}

fn c_ok() -> Color {
    Color::Rgb(22, 163, 74)
}

fn c_warn() -> Color {
    Color::Rgb(245, 158, 11)
}

fn c_muted() -> Color {
    Color::Rgb(100, 116, 139)
}

const SPINNER_FRAMES: &[&str] = &["·  ", "·· ", "···", " ··", "  ·"];

const SPINNER_INTERVAL_MS: u64 = 275;

fn update_spinner(app: &mut App) {
    if !app.busy() {
        return;
    }
    let now = Instant::now();
    if now.duration_since(app.spinner_last) >= Duration::from_millis(SPINNER_INTERVAL_MS) {
        app.spinner_last = now;
        app.spinner_step = app.spinner_step.wrapping_add(1);
    }
}

fn ping_pong_index(step: u64, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = (len - 1) * 2;
    let pos = (step as usize) % period;
    if pos < len { pos } else { period - pos }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_bounces_between_ends() {
        let seq: Vec<usize> = (0..8).map(|s| ping_pong_index(s, 3)).collect();
        assert_eq!(seq, vec![0, 1, 2, 1, 0, 1, 2, 1]);
        assert_eq!(ping_pong_index(7, 1), 0);
    }

    #[test]
    fn centered_rows_clamps_to_area() {
        let area = Rect::new(2, 4, 10, 6);
        assert_eq!(centered_rows(area, 2), Rect::new(2, 6, 10, 2));
        assert_eq!(centered_rows(area, 20), area);
    }
}
