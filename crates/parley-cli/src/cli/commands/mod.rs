//! CLI command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use parley_core::conversation::{ConversationStore, FileStore, MemoryStore};
use parley_core::transcript::ConversationTranscript;

use super::ConversationArgs;

pub mod chat;
pub mod config;
pub mod conversations;
pub mod exec;

impl ConversationArgs {
    /// Store that receives saves: the conversations directory, or an
    /// in-memory store under `--no-save`.
    fn store(&self) -> Arc<dyn ConversationStore> {
        if self.no_save {
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(FileStore::open_default())
        }
    }

    /// The conversation named by `--conversation`, or a fresh one.
    fn resolve(&self) -> Result<ConversationTranscript> {
        let Some(id) = self.conversation.as_deref() else {
            return Ok(ConversationTranscript::new());
        };
        conversations::load(&FileStore::open_default(), id)
            .with_context(|| format!("open conversation '{id}'"))
    }
}
