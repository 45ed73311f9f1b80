//! Transcript input handling: mouse wheel and scroll keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use super::state::TranscriptState;

/// Lines scrolled per mouse wheel notch.
const MOUSE_SCROLL_LINES: usize = 1;

/// Accumulates wheel deltas; applied on the next tick.
pub fn handle_mouse(transcript: &mut TranscriptState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            transcript
                .scroll_accumulator
                .accumulate(-(MOUSE_SCROLL_LINES as i32));
        }
        MouseEventKind::ScrollDown => {
            transcript
                .scroll_accumulator
                .accumulate(MOUSE_SCROLL_LINES as i32);
        }
        _ => {}
    }
}

/// Applies the wheel delta gathered since the last call.
pub fn apply_scroll_delta(transcript: &mut TranscriptState) {
    let delta = transcript.scroll_accumulator.take_delta();
    if delta == 0 {
        return;
    }

    let lines = delta.unsigned_abs() as usize;
    if delta < 0 {
        transcript.scroll_up(lines);
    } else {
        transcript.scroll_down(lines);
    }
}

/// Handles transcript scroll keys. Returns `true` if the key was consumed.
pub fn handle_scroll_key(transcript: &mut TranscriptState, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::PageUp => transcript.page_up(),
        KeyCode::PageDown => transcript.page_down(),
        KeyCode::Home if ctrl => transcript.scroll.scroll_to_top(),
        KeyCode::End if ctrl => transcript.scroll.scroll_to_bottom(),
        _ => return false,
    }
    true
}
