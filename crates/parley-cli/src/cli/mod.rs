//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Chat with a coding assistant in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the chat model from config
    #[arg(short, long, global = true)]
    model: Option<String>,
}

/// Arguments shared by commands that persist conversations.
#[derive(clap::Args, Debug, Clone, Default)]
struct ConversationArgs {
    /// Continue a saved conversation (full id or unique prefix)
    #[arg(long, value_name = "ID")]
    conversation: Option<String>,

    /// Do not save the conversation
    #[arg(long = "no-save")]
    no_save: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Opens the interactive chat (default)
    Chat {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// Show replies at once instead of typing them out
        #[arg(long = "no-typewriter")]
        no_typewriter: bool,
    },

    /// Sends one prompt and prints the reply
    Exec {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,

        /// Print the reply exactly as received, markup included
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        conversation: ConversationArgs,
    },

    /// Manage saved conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConversationCommands {
    /// Lists saved conversations, most recent first
    List,
    /// Prints a saved conversation
    Show {
        /// Full id or unique prefix
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
    /// Deletes a saved conversation
    Delete {
        /// Full id or unique prefix
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging is best effort; a read-only home must not block the CLI.
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Chat {
        conversation: ConversationArgs::default(),
        no_typewriter: false,
    });

    match command {
        // Config commands work even when the config file is broken.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Commands::Chat {
            conversation,
            no_typewriter,
        } => {
            let config = load_config(cli.model)?;
            commands::chat::run(&config, &conversation, no_typewriter).await
        }
        Commands::Exec {
            prompt,
            raw,
            conversation,
        } => {
            let config = load_config(cli.model)?;
            commands::exec::run(commands::exec::ExecOptions {
                config: &config,
                conversation: &conversation,
                prompt: &prompt,
                raw,
            })
            .await
        }
        Commands::Conversations { command } => match command {
            ConversationCommands::List => commands::conversations::list(),
            ConversationCommands::Show { id } => commands::conversations::show(&id),
            ConversationCommands::Delete { id } => commands::conversations::delete(&id),
        },
    }
}

fn load_config(model_override: Option<String>) -> Result<config::Config> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(model) = model_override {
        config.model = model;
    }
    Ok(config)
}
