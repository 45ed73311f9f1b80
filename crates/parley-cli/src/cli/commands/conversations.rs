//! Conversation command handlers.

use anyhow::{Context, Result, bail};
use parley_core::conversation::{ConversationStore, FileStore};
use parley_core::message::Message;
use parley_core::transcript::ConversationTranscript;
use parley_tui::transcript::render_plain;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn list() -> Result<()> {
    let store = FileStore::open_default();
    let conversations = store.list().context("list conversations")?;
    if conversations.is_empty() {
        println!("No conversations found.");
        return Ok(());
    }
    for summary in conversations {
        println!(
            "{}  {}  {}  ({} messages)",
            summary.id,
            summary.last_updated.format(TIMESTAMP_FORMAT),
            summary.title,
            summary.message_count
        );
    }
    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let conversation = load(&FileStore::open_default(), id)?;
    println!("{}", conversation.title());
    println!("{}", conversation.id());
    for message in conversation.conversation_messages() {
        println!();
        println!("{}", format_message(message));
    }
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let store = FileStore::open_default();
    let full_id = resolve(&store, id)?;
    if !store
        .delete(&full_id)
        .with_context(|| format!("delete conversation '{full_id}'"))?
    {
        bail!("Conversation '{full_id}' not found");
    }
    println!("Deleted conversation {full_id}");
    Ok(())
}

/// Loads the conversation matching a full id or unique prefix.
pub fn load(store: &dyn ConversationStore, id: &str) -> Result<ConversationTranscript> {
    let full_id = resolve(store, id)?;
    let messages = store
        .load(&full_id)
        .with_context(|| format!("load conversation '{full_id}'"))?
        .with_context(|| format!("Conversation '{full_id}' not found"))?;
    Ok(ConversationTranscript::with_messages(full_id, messages))
}

fn resolve(store: &dyn ConversationStore, id: &str) -> Result<String> {
    store
        .resolve_id(id)?
        .with_context(|| format!("No conversation matches '{id}'"))
}

fn format_message(message: &Message) -> String {
    if message.is_user {
        format!("You: {}", message.text)
    } else {
        format!("Parley: {}", render_plain(&message.text))
    }
}
