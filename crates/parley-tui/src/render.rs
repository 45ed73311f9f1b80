//! Pure view functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use parley_core::conversation::short_id;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::input;
use crate::state::{AppState, NoticeKind};
use crate::transcript::{self, Style as TranscriptStyle, StyledLine, StyledSpan};

/// Height of the status line between transcript and input.
const STATUS_HEIGHT: u16 = 1;

/// Horizontal margin for the transcript area (each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Render frames per spinner frame.
const SPINNER_SPEED_DIVISOR: usize = 6;

const IDLE_HINT: &str = "Enter send · Ctrl+J newline · PgUp/PgDn scroll · /help";

/// Width available to transcript text.
pub fn transcript_width(width: u16) -> usize {
    width.saturating_sub(TRANSCRIPT_MARGIN * 2) as usize
}

/// Rows available to the transcript for a terminal of `height` rows.
pub fn transcript_height(app: &AppState, width: u16, height: u16) -> usize {
    let input_height = input::calculate_input_height(&app.input, width, height);
    height.saturating_sub(input_height + STATUS_HEIGHT) as usize
}

/// Renders the whole UI.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let input_height = input::calculate_input_height(&app.input, area.width, area.height);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(input_height),
        ])
        .split(area);

    render_transcript_area(app, frame, chunks[0]);
    render_status_line(app, frame, chunks[1]);
    input::render_input(frame, chunks[2], &app.input, app.is_busy());
}

fn render_transcript_area(app: &AppState, frame: &mut Frame, area: Rect) {
    let area = area.inner(Margin {
        horizontal: TRANSCRIPT_MARGIN,
        vertical: 0,
    });
    let lines = transcript::render_transcript(&app.transcript, area.width as usize);
    let visible = transcript::visible_lines(&app.transcript, lines, area.height as usize);
    frame.render_widget(Paragraph::new(visible), area);
}

fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let right = format!(
        "{} · {} ",
        app.model,
        short_id(app.transcript.conversation().id())
    );
    let left_width = (area.width as usize).saturating_sub(right.width() + 1);

    let mut spans = status_spans(app);
    let left_text: String = spans.iter().map(|s| s.content.as_ref()).collect();
    let used = left_text.width().min(left_width);
    spans.push(Span::raw(" ".repeat(left_width - used + 1)));
    spans.push(Span::styled(right, Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn status_spans(app: &AppState) -> Vec<Span<'static>> {
    let spinner = SPINNER_FRAMES[(app.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()];

    if app.is_loading() {
        return vec![Span::styled(
            format!(" {spinner} Thinking…"),
            Style::default().fg(Color::Yellow),
        )];
    }
    if app.typewriter.is_revealing() {
        return vec![Span::styled(
            " Typing… Esc to skip",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )];
    }

    match &app.notice {
        Some(notice) if notice.kind == NoticeKind::Error => vec![Span::styled(
            format!(" {}", notice.text),
            Style::default().fg(Color::Red),
        )],
        Some(notice) => notice_line(&notice.text).spans,
        None => notice_line(IDLE_HINT).spans,
    }
}

fn notice_line(text: &str) -> Line<'static> {
    transcript::convert_styled_line(StyledLine {
        spans: vec![StyledSpan::new(format!(" {text}"), TranscriptStyle::Notice)],
    })
}
