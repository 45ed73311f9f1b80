//! Chat command handler.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use parley_core::config::Config;

use super::exec;
use crate::cli::ConversationArgs;

pub async fn run(config: &Config, args: &ConversationArgs, no_typewriter: bool) -> Result<()> {
    // Piped input is a one-shot prompt.
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        return exec::run(exec::ExecOptions {
            config,
            conversation: args,
            prompt,
            raw: false,
        })
        .await;
    }

    let mut config = config.clone();
    if no_typewriter {
        config.typewriter = false;
    }

    let conversation = args.resolve()?;
    parley_tui::run_interactive_chat(&config, args.store(), conversation)
        .await
        .context("interactive chat failed")
}
