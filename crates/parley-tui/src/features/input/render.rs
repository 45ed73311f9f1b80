//! Input feature view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::state::InputState;

/// Minimum height of the input area (lines, including borders).
const INPUT_HEIGHT_MIN: u16 = 3;

/// Maximum height of the input area as a fraction of screen height.
const INPUT_HEIGHT_MAX_PERCENT: f32 = 0.4;

const PLACEHOLDER: &str = "Ask a coding question… (/help for commands)";

/// Wrapped buffer lines plus the visual cursor position.
struct WrappedInput {
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
}

/// Hard-wraps the buffer at `width` columns, tracking where the cursor lands.
fn wrap_input(input: &InputState, width: usize) -> WrappedInput {
    let width = width.max(1);
    let text = input.text();
    let cursor = input.buffer.cursor();

    let mut lines = vec![String::new()];
    let mut col = 0;
    let mut cursor_pos = None;

    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            if idx == cursor {
                cursor_pos = Some((lines.len() - 1, col));
            }
            lines.push(String::new());
            col = 0;
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if col + w > width {
            lines.push(String::new());
            col = 0;
        }
        if idx == cursor {
            cursor_pos = Some((lines.len() - 1, col));
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        col += w;
    }

    let (cursor_row, cursor_col) = cursor_pos.unwrap_or_else(|| {
        if col >= width {
            lines.push(String::new());
            (lines.len() - 1, 0)
        } else {
            (lines.len() - 1, col)
        }
    });

    WrappedInput {
        lines,
        cursor_row,
        cursor_col,
    }
}

/// Height of the input area for the current buffer, borders included.
pub fn calculate_input_height(input: &InputState, width: u16, screen_height: u16) -> u16 {
    let inner_width = width.saturating_sub(2) as usize;
    let content = wrap_input(input, inner_width).lines.len() as u16;
    let max = ((f32::from(screen_height) * INPUT_HEIGHT_MAX_PERCENT) as u16).max(INPUT_HEIGHT_MIN);
    (content + 2).clamp(INPUT_HEIGHT_MIN, max)
}

/// Renders the prompt editor and places the terminal cursor.
pub fn render_input(frame: &mut Frame, area: Rect, input: &InputState, busy: bool) {
    let border_color = if busy { Color::DarkGray } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Line::from(Span::styled(
            " Parley ",
            Style::default().add_modifier(Modifier::BOLD),
        )));

    let inner = block.inner(area);
    let visible_rows = inner.height as usize;

    if input.text().is_empty() {
        let placeholder = Line::from(Span::styled(
            PLACEHOLDER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        frame.set_cursor_position(Position::new(inner.x, inner.y));
        return;
    }

    let wrapped = wrap_input(input, inner.width as usize);
    let scroll = (wrapped.cursor_row + 1).saturating_sub(visible_rows);
    let lines: Vec<Line<'static>> = wrapped
        .lines
        .into_iter()
        .skip(scroll)
        .take(visible_rows)
        .map(Line::from)
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
    frame.set_cursor_position(Position::new(
        inner.x + wrapped.cursor_col as u16,
        inner.y + (wrapped.cursor_row - scroll) as u16,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(text: &str) -> InputState {
        let mut input = InputState::new();
        input.set_text(text);
        input
    }

    #[test]
    fn test_wrap_tracks_cursor_at_end() {
        let wrapped = wrap_input(&input_with("abcdef"), 4);
        assert_eq!(wrapped.lines, vec!["abcd", "ef"]);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 2));
    }

    #[test]
    fn test_wrap_cursor_after_full_line_moves_down() {
        let wrapped = wrap_input(&input_with("abcd"), 4);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 0));
    }

    #[test]
    fn test_wrap_cursor_mid_text() {
        let mut input = input_with("ab\ncd");
        input.buffer.move_home();
        let wrapped = wrap_input(&input, 10);
        assert_eq!(wrapped.lines, vec!["ab", "cd"]);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 0));
    }

    #[test]
    fn test_input_height_grows_and_caps() {
        assert_eq!(calculate_input_height(&input_with(""), 40, 40), 3);
        assert_eq!(calculate_input_height(&input_with("a\nb\nc"), 40, 40), 5);
        assert_eq!(calculate_input_height(&input_with(&"x\n".repeat(50)), 40, 40), 16);
    }
}
