//! Shared TUI primitives.

pub mod clipboard;
pub mod commands;
pub mod request_id;
pub mod text;

pub use clipboard::{Clipboard, ClipboardError};
pub use commands::{SlashCommand, help_text};
pub use request_id::{LatestOnly, RequestId};
pub use text::sanitize_for_display;
