//! Full-screen chat UI for Parley.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod markdown;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod typewriter;
pub mod update;

use std::io::{IsTerminal, Write, stderr};
use std::sync::Arc;

use anyhow::Result;
pub use features::{input, transcript};
use parley_core::config::Config;
use parley_core::conversation::{ConversationStore, short_id};
use parley_core::providers::{self, ReplyProvider};
use parley_core::transcript::ConversationTranscript;
pub use runtime::TuiRuntime;

/// Runs the interactive chat until the user quits.
///
/// Must be called from a multi-threaded tokio runtime; the event loop
/// blocks its thread while replies are fetched on the others.
///
/// # Errors
/// Returns an error when stderr is not a terminal, no provider can be
/// built, or terminal I/O fails.
pub async fn run_interactive_chat(
    config: &Config,
    store: Arc<dyn ConversationStore>,
    conversation: ConversationTranscript,
) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `parley exec --prompt '...'` for non-interactive use."
        );
    }

    let chain = providers::build_chain(config)?;
    let mut err = stderr();
    writeln!(err, "Parley")?;
    writeln!(err, "Model: {}", config.model)?;
    writeln!(err, "Providers: {}", chain.provider_names().join(" → "))?;
    writeln!(err, "Conversation: {}", short_id(conversation.id()))?;
    err.flush()?;

    tracing::info!(
        conversation = conversation.id(),
        providers = ?chain.provider_names(),
        "Starting chat"
    );
    let provider: Arc<dyn ReplyProvider> = Arc::new(chain);
    let mut runtime = TuiRuntime::new(config, provider, store, conversation)?;
    let result = runtime.run();
    runtime.flush_saves().await;
    drop(runtime);
    result?;

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
