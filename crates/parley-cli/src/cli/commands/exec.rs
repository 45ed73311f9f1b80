//! Exec command handler.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use parley_core::config::Config;
use parley_core::message::Message;
use parley_core::providers::{self, ReplyProvider};
use parley_tui::transcript::render_plain;

use crate::cli::ConversationArgs;

pub struct ExecOptions<'a> {
    pub config: &'a Config,
    pub conversation: &'a ConversationArgs,
    pub prompt: &'a str,
    /// Print the reply verbatim instead of stripping markup.
    pub raw: bool,
}

/// Sends one prompt, prints the reply to stdout and saves the exchange.
///
/// Unlike chat, a failed fetch is an error rather than a fallback reply.
pub async fn run(options: ExecOptions<'_>) -> Result<()> {
    let mut conversation = options.conversation.resolve()?;
    let store = options.conversation.store();
    let chain = providers::build_chain(options.config).context("build providers")?;

    let prompt = options.prompt.trim();
    let context = conversation.context();
    tracing::info!(
        conversation = conversation.id(),
        context = context.len(),
        "exec prompt"
    );
    let reply = chain
        .fetch_reply(prompt, &context)
        .await
        .context("fetch reply")?;

    let mut stdout = std::io::stdout().lock();
    if options.raw {
        writeln!(stdout, "{reply}")?;
    } else {
        writeln!(stdout, "{}", render_plain(&reply))?;
    }
    stdout.flush()?;

    conversation.push(Message::user(prompt));
    conversation.push(Message::assistant(reply));
    store
        .save(
            conversation.id(),
            conversation.conversation_messages(),
            Utc::now(),
        )
        .context("save conversation")?;
    if !options.conversation.no_save {
        eprintln!("Conversation: {}", conversation.id());
    }
    Ok(())
}
