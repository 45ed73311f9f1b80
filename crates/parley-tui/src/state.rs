//! Application state composition.
//!
//! ```text
//! AppState
//! ├── input: InputState            (prompt buffer, history)
//! ├── transcript: TranscriptState  (conversation, scroll, wrap cache, copy feedback)
//! ├── typewriter: TypewriterController
//! ├── reply / load: LatestOnly     (in-flight request ids)
//! └── notice                       (status line message)
//! ```

use parley_core::config::Config;
use parley_core::transcript::ConversationTranscript;

use crate::common::LatestOnly;
use crate::input::InputState;
use crate::transcript::TranscriptState;
use crate::typewriter::TypewriterController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line message shown in the status line until the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub should_quit: bool,
    pub input: InputState,
    pub transcript: TranscriptState,
    pub typewriter: TypewriterController,
    /// Reveal replies with the typewriter; otherwise they appear at once.
    pub typewriter_enabled: bool,
    /// Provider fetch in flight.
    pub reply: LatestOnly,
    /// `/open` load in flight.
    pub load: LatestOnly,
    pub notice: Option<Notice>,
    pub spinner_frame: usize,
    /// Model label for the status line.
    pub model: String,
}

impl AppState {
    pub fn new(config: &Config, conversation: ConversationTranscript) -> Self {
        Self {
            should_quit: false,
            input: InputState::new(),
            transcript: TranscriptState::new(conversation),
            typewriter: TypewriterController::new(),
            typewriter_enabled: config.typewriter,
            reply: LatestOnly::default(),
            load: LatestOnly::default(),
            notice: None,
            spinner_frame: 0,
            model: config.model.clone(),
        }
    }

    /// True while a reply is being fetched; sending is disabled.
    pub fn is_loading(&self) -> bool {
        self.reply.has_active()
    }

    /// True while a fetch or reveal is running.
    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.typewriter.is_revealing()
    }
}
