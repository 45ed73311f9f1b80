//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! frame/tick pulses from the event loop, and results of async effects sent
//! through the runtime inbox.

use crossterm::event::Event;
use parley_core::message::Message;
use parley_core::providers::ProviderError;

use crate::common::RequestId;
use crate::transcript::CopyTarget;
use crate::typewriter::RevealId;

/// A stored conversation fetched for `/open`.
#[derive(Debug, Clone)]
pub struct LoadedConversation {
    pub id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub enum UiEvent {
    /// Render cadence pulse; drives copy-feedback expiry and wheel scrolling.
    Tick,
    /// Emitted first in every loop iteration with the terminal size.
    Frame { width: u16, height: u16 },
    Terminal(Event),

    /// Reply for the fetch identified by `request`.
    ReplyReceived {
        request: RequestId,
        result: Result<String, ProviderError>,
    },
    /// Timer for reveal `id` fired.
    RevealTick(RevealId),

    ConversationLoaded {
        request: RequestId,
        result: Result<LoadedConversation, String>,
    },
    /// The clipboard write for `target` finished.
    CopyFinished {
        target: CopyTarget,
        result: Result<(), String>,
    },
}
