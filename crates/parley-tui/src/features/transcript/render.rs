//! Transcript rendering.
//!
//! Converts the UI-agnostic `StyledLine`s built by the transcript state into
//! ratatui lines and slices them to the visible window.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::state::TranscriptState;
use super::style::{Style as TranscriptStyle, StyledLine};

/// Renders every transcript line at `width`.
pub fn render_transcript(transcript: &TranscriptState, width: usize) -> Vec<Line<'static>> {
    transcript
        .build_lines(width)
        .into_iter()
        .map(convert_styled_line)
        .collect()
}

/// Visible window of `lines` for a viewport of `height` rows, bottom-aligned
/// when the content is shorter than the viewport.
pub fn visible_lines(
    transcript: &TranscriptState,
    lines: Vec<Line<'static>>,
    height: usize,
) -> Vec<Line<'static>> {
    let total = lines.len();
    let max_offset = total.saturating_sub(height);
    let offset = if transcript.scroll.is_following() {
        max_offset
    } else {
        transcript.scroll.get_offset(height).min(max_offset)
    };
    let visible: Vec<Line<'static>> = lines.into_iter().skip(offset).take(height).collect();

    if visible.len() >= height {
        return visible;
    }
    let mut padded = vec![Line::default(); height - visible.len()];
    padded.extend(visible);
    padded
}

pub fn convert_styled_line(styled_line: StyledLine) -> Line<'static> {
    let spans: Vec<Span<'static>> = styled_line
        .spans
        .into_iter()
        .map(|s| Span::styled(s.text, convert_style(s.style)))
        .collect();
    Line::from(spans)
}

fn convert_style(style: TranscriptStyle) -> Style {
    match style {
        TranscriptStyle::Plain => Style::default(),
        TranscriptStyle::UserPrefix => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::User => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        TranscriptStyle::Assistant => Style::default().fg(Color::White),
        TranscriptStyle::StreamingCursor => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::SLOW_BLINK),
        TranscriptStyle::Notice => Style::default().fg(Color::DarkGray),
        TranscriptStyle::CodeHeader => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::CopyHint => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::ITALIC),
        TranscriptStyle::Copied => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),

        // Markdown styles
        TranscriptStyle::CodeBlock => Style::default().fg(Color::Cyan),
        TranscriptStyle::CodeFence => Style::default().fg(Color::DarkGray),
        TranscriptStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        TranscriptStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        TranscriptStyle::StrongEmphasis => {
            Style::default().add_modifier(Modifier::BOLD | Modifier::ITALIC)
        }
        TranscriptStyle::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        TranscriptStyle::H2 => Style::default().add_modifier(Modifier::BOLD),
        TranscriptStyle::H3 => Style::default()
            .add_modifier(Modifier::ITALIC)
            .fg(Color::White),
        TranscriptStyle::ListBullet => Style::default().fg(Color::Yellow),
    }
}

#[cfg(test)]
mod tests {
    use parley_core::message::Message;

    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_visible_lines_bottom_aligned() {
        let state = TranscriptState::default();
        let lines = vec![Line::from("a"), Line::from("b")];
        let visible = visible_lines(&state, lines, 4);
        let texts: Vec<_> = visible.iter().map(line_text).collect();
        assert_eq!(texts, vec!["", "", "a", "b"]);
    }

    #[test]
    fn test_visible_lines_follow_and_anchor() {
        let mut state = TranscriptState::default();
        let lines: Vec<Line<'static>> = (0..10).map(|i| Line::from(i.to_string())).collect();
        state.scroll.update_line_count(lines.len());

        let tail = visible_lines(&state, lines.clone(), 3);
        assert_eq!(tail.iter().map(line_text).collect::<Vec<_>>(), vec!["7", "8", "9"]);

        state.scroll.scroll_to_top();
        let head = visible_lines(&state, lines, 3);
        assert_eq!(head.iter().map(line_text).collect::<Vec<_>>(), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_render_transcript_styles_cursor() {
        let mut state = TranscriptState::default();
        state.push(Message::typing("hi"));
        let lines = render_transcript(&state, 40);
        let cursor_line = &lines[lines.len() - 2];
        let cursor = cursor_line.spans.last().unwrap();
        assert_eq!(cursor.content, "▌");
        assert!(cursor.style.add_modifier.contains(Modifier::SLOW_BLINK));
    }
}
