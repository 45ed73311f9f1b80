//! "Copied!" feedback for code blocks.
//!
//! The indicator is driven by a deadline checked on UI ticks, so it expires
//! on its own clock regardless of any reveal in progress.

use std::time::{Duration, Instant};

/// How long a code block shows "Copied!".
pub const COPY_FEEDBACK: Duration = Duration::from_millis(2000);

/// A code block within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTarget {
    /// Index of the message in the transcript.
    pub message: usize,
    /// `block_index` of the code block within the message.
    pub block: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CopyState {
    active: Option<CopyTarget>,
    expires_at: Option<Instant>,
}

impl CopyState {
    /// Shows the indicator on `target`, replacing any other.
    pub fn mark_copied(&mut self, target: CopyTarget, now: Instant) {
        self.active = Some(target);
        self.expires_at = Some(now + COPY_FEEDBACK);
    }

    pub fn is_copied(&self, target: CopyTarget) -> bool {
        self.active == Some(target)
    }

    /// Block showing the indicator within `message`, if any.
    pub fn copied_block_for(&self, message: usize) -> Option<usize> {
        self.active
            .filter(|t| t.message == message)
            .map(|t| t.block)
    }

    /// Returns true if a deadline is pending (the runtime polls faster).
    pub fn has_pending_clear(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Clears the indicator once its deadline has passed. Returns true if
    /// it was cleared.
    pub fn check_expired(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) if now >= deadline => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.expires_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_expires_after_feedback_window() {
        let mut state = CopyState::default();
        let start = Instant::now();
        let target = CopyTarget {
            message: 4,
            block: 1,
        };
        state.mark_copied(target, start);
        assert!(state.is_copied(target));
        assert_eq!(state.copied_block_for(4), Some(1));
        assert_eq!(state.copied_block_for(3), None);
        assert!(state.has_pending_clear());

        assert!(!state.check_expired(start + Duration::from_millis(1999)));
        assert!(state.is_copied(target));
        assert!(state.check_expired(start + COPY_FEEDBACK));
        assert!(!state.is_copied(target));
        assert!(!state.has_pending_clear());
    }

    #[test]
    fn test_new_copy_replaces_previous() {
        let mut state = CopyState::default();
        let now = Instant::now();
        let first = CopyTarget {
            message: 2,
            block: 0,
        };
        let second = CopyTarget {
            message: 2,
            block: 1,
        };
        state.mark_copied(first, now);
        state.mark_copied(second, now + Duration::from_millis(1500));
        assert!(!state.is_copied(first));
        assert!(!state.check_expired(now + Duration::from_millis(2500)));
        assert!(state.is_copied(second));
    }
}
