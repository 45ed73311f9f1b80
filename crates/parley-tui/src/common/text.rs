//! Text utilities for TUI rendering.

use std::borrow::Cow;

/// Makes untrusted text safe to print: control characters other than
/// newlines are dropped and tabs expand to four spaces.
///
/// Dropping ESC keeps a reply from emitting its own terminal escape
/// sequences.
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control() && c != '\n') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("    "),
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
