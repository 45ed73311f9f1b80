//! Input feature reducer.
//!
//! Handles prompt editing and history navigation. Submission is reported
//! back to the app reducer, which decides whether a prompt may be sent.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::InputState;
use crate::common::sanitize_for_display;

/// What the app reducer should do after an input key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Enter was pressed; the buffer is left intact.
    Submit,
    /// The key edited the buffer or moved the cursor.
    Handled,
    /// The key is not an input key.
    Ignored,
}

/// Inserts pasted text with escapes stripped and tabs expanded.
pub fn handle_paste(input: &mut InputState, text: &str) {
    input.buffer.insert_str(&sanitize_for_display(text));
}

/// Handles a key press for the prompt editor.
pub fn handle_key(input: &mut InputState, key: KeyEvent) -> InputAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Enter if shift || alt => input.buffer.insert_newline(),
        KeyCode::Char('j') if ctrl => input.buffer.insert_newline(),
        KeyCode::Enter => return InputAction::Submit,

        KeyCode::Char('a') if ctrl => input.buffer.move_home(),
        KeyCode::Char('e') if ctrl => input.buffer.move_end(),
        KeyCode::Char('u') if ctrl => input.clear(),

        KeyCode::Backspace => input.buffer.delete_prev(),
        KeyCode::Delete => input.buffer.delete_next(),
        KeyCode::Left => input.buffer.move_left(),
        KeyCode::Right => input.buffer.move_right(),
        KeyCode::Home if !ctrl => input.buffer.move_home(),
        KeyCode::End if !ctrl => input.buffer.move_end(),

        KeyCode::Up if input.should_navigate_up() => input.navigate_up(),
        KeyCode::Down if input.should_navigate_down() => input.navigate_down(),

        KeyCode::Char(ch) if !ctrl && !alt => {
            input.buffer.insert_char(ch);
            input.reset_navigation();
        }
        KeyCode::Tab => input.buffer.insert_str("    "),

        _ => return InputAction::Ignored,
    }
    InputAction::Handled
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventKind, KeyEventState};

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_str(input: &mut InputState, text: &str) {
        for ch in text.chars() {
            handle_key(input, key(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    #[test]
    fn test_typing_and_newlines() {
        let mut input = InputState::new();
        type_str(&mut input, "ab");
        handle_key(&mut input, key(KeyCode::Char('j'), KeyModifiers::CONTROL));
        handle_key(&mut input, key(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut input, "c");
        assert_eq!(input.text(), "ab\n\nc");
    }

    #[test]
    fn test_enter_submits_without_clearing() {
        let mut input = InputState::new();
        type_str(&mut input, "hi");
        assert_eq!(
            handle_key(&mut input, key(KeyCode::Enter, KeyModifiers::NONE)),
            InputAction::Submit
        );
        assert_eq!(input.text(), "hi");
    }

    #[test]
    fn test_ctrl_c_is_not_an_input_key() {
        let mut input = InputState::new();
        assert_eq!(
            handle_key(&mut input, key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputAction::Ignored
        );
        assert!(input.text().is_empty());
    }

    #[test]
    fn test_paste_is_sanitized() {
        let mut input = InputState::new();
        handle_paste(&mut input, "a\tb\x1b[31m");
        assert_eq!(input.text(), "a    b[31m");
    }

    #[test]
    fn test_up_recalls_history() {
        let mut input = InputState::new();
        input.set_text("earlier");
        input.take_submission();
        handle_key(&mut input, key(KeyCode::Up, KeyModifiers::NONE));
        assert_eq!(input.text(), "earlier");
        handle_key(&mut input, key(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(input.text(), "");
    }
}
