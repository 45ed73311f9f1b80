//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never performs
//! either directly.

use std::time::Duration;

use parley_core::message::{ContextMessage, Message};

use crate::common::RequestId;
use crate::transcript::CopyTarget;
use crate::typewriter::RevealId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Ask the provider chain for a reply to `prompt`.
    FetchReply {
        request: RequestId,
        prompt: String,
        context: Vec<ContextMessage>,
    },

    /// Abort the in-flight fetch, if any.
    CancelReply,

    /// Send `UiEvent::RevealTick(id)` after `delay`.
    ScheduleRevealTick { id: RevealId, delay: Duration },

    /// Persist the conversation (welcome messages excluded).
    SaveConversation { id: String, messages: Vec<Message> },

    /// Resolve `id` (full id or prefix) and load it.
    LoadConversation { request: RequestId, id: String },

    /// Copy text to the clipboard.
    CopyToClipboard { text: String, target: CopyTarget },
}
