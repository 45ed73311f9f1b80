//! Input state.
//!
//! Manages the prompt buffer, prompt history, and history navigation.

use super::text_buffer::TextBuffer;

#[derive(Debug, Default)]
pub struct InputState {
    pub buffer: TextBuffer,

    /// Submitted prompts for ↑/↓ navigation.
    pub history: Vec<String>,

    /// Current position in history (None = not navigating).
    pub history_index: Option<usize>,

    /// Draft text saved when navigating history.
    pub draft: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.reset_navigation();
    }

    /// Takes the buffer contents for submission and records them in
    /// history.
    pub fn take_submission(&mut self) -> String {
        let text = self.buffer.take();
        if !text.trim().is_empty() && self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        self.reset_navigation();
        text
    }

    pub fn reset_navigation(&mut self) {
        self.history_index = None;
        self.draft = None;
    }

    /// Returns true if ↑ should navigate history rather than move the
    /// cursor.
    pub fn should_navigate_up(&self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        self.history_index.is_some() || self.buffer.cursor_position().0 == 0
    }

    /// Returns true if ↓ should navigate history rather than move the
    /// cursor.
    pub fn should_navigate_down(&self) -> bool {
        self.history_index.is_some()
            && self.buffer.cursor_position().0 + 1 >= self.buffer.line_count()
    }

    pub fn navigate_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        match self.history_index {
            None => {
                self.draft = Some(self.buffer.text().to_string());
                self.history_index = Some(self.history.len() - 1);
            }
            Some(idx) if idx > 0 => self.history_index = Some(idx - 1),
            Some(_) => {}
        }

        if let Some(entry) = self.history_index.and_then(|i| self.history.get(i)).cloned() {
            self.buffer.set_text(entry);
        }
    }

    pub fn navigate_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if let Some(entry) = self.history.get(idx + 1).cloned() {
            self.history_index = Some(idx + 1);
            self.buffer.set_text(entry);
        } else {
            let draft = self.draft.take().unwrap_or_default();
            self.history_index = None;
            self.buffer.set_text(draft);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut input = InputState::new();
        input.set_text("first");
        input.take_submission();
        input.set_text("second");
        input.take_submission();

        input.set_text("dra");
        input.navigate_up();
        assert_eq!(input.text(), "second");
        input.navigate_up();
        assert_eq!(input.text(), "first");
        input.navigate_up();
        assert_eq!(input.text(), "first");

        input.navigate_down();
        assert_eq!(input.text(), "second");
        input.navigate_down();
        assert_eq!(input.text(), "dra");
        assert_eq!(input.history_index, None);
    }

    #[test]
    fn test_blank_and_repeated_prompts_not_recorded() {
        let mut input = InputState::new();
        input.set_text("   ");
        input.take_submission();
        input.set_text("same");
        input.take_submission();
        input.set_text("same");
        input.take_submission();
        assert_eq!(input.history, vec!["same".to_string()]);
    }
}
