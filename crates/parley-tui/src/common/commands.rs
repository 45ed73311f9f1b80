//! Slash commands typed into the prompt.

/// Definition of a command.
#[derive(Debug, Clone)]
pub struct Command {
    /// Primary name without the leading slash.
    pub name: &'static str,
    /// Aliases without leading slashes.
    pub aliases: &'static [&'static str],
    /// Argument placeholder shown in help, if any.
    pub usage: &'static str,
    pub description: &'static str,
}

impl Command {
    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Help line, e.g. "/copy [n]  Copy a code block".
    pub fn help_line(&self) -> String {
        let mut head = format!("/{}", self.name);
        if !self.usage.is_empty() {
            head.push(' ');
            head.push_str(self.usage);
        }
        format!("{head:<12}{}", self.description)
    }
}

/// Available commands.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "new",
        aliases: &["clear"],
        usage: "",
        description: "Start a new conversation",
    },
    Command {
        name: "open",
        aliases: &["load"],
        usage: "<id>",
        description: "Open a saved conversation by id or prefix",
    },
    Command {
        name: "copy",
        aliases: &[],
        usage: "[n]",
        description: "Copy code block n of the latest reply",
    },
    Command {
        name: "help",
        aliases: &["?"],
        usage: "",
        description: "Show commands",
    },
    Command {
        name: "quit",
        aliases: &["exit", "q"],
        usage: "",
        description: "Exit Parley",
    },
];

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    Open(String),
    /// One-based block number; `None` copies the first block.
    Copy(Option<usize>),
    Help,
    Quit,
    /// Unrecognized command or bad arguments; carries a message for the user.
    Invalid(String),
}

/// Parses `input` as a slash command. Returns `None` for ordinary prompts.
pub fn parse(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix('/')?;
    if rest.is_empty() || rest.contains('\n') {
        return None;
    }

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let Some(command) = COMMANDS.iter().find(|c| c.is(name)) else {
        return Some(SlashCommand::Invalid(format!(
            "Unknown command /{name}. Type /help for commands."
        )));
    };

    Some(match command.name {
        "new" => SlashCommand::New,
        "open" if arg.is_empty() => SlashCommand::Invalid("Usage: /open <id>".to_string()),
        "open" => SlashCommand::Open(arg.to_string()),
        "copy" if arg.is_empty() => SlashCommand::Copy(None),
        "copy" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => SlashCommand::Copy(Some(n)),
            _ => SlashCommand::Invalid("Usage: /copy [n] (n starts at 1)".to_string()),
        },
        "help" => SlashCommand::Help,
        _ => SlashCommand::Quit,
    })
}

/// Help text listing every command.
pub fn help_text() -> String {
    COMMANDS
        .iter()
        .map(Command::help_line)
        .collect::<Vec<_>>()
        .join("  ·  ")
}
