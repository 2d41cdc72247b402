//! Bot commands: prefix parsing and slash command definitions.

use regex::Regex;
use serenity::all::{CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption};

pub const ASK_COMMAND: &str = "ai";
pub const PING_COMMAND: &str = "ping";
pub const PROMPT_OPTION: &str = "prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    /// Raw prompt text, possibly empty.
    Ask(String),
}

/// Parses `<prefix><name> [args]` text messages.
pub struct CommandParser {
    pattern: Regex,
}

impl CommandParser {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?s)^{}([A-Za-z]+)(?:\s+(.*))?$",
            regex::escape(prefix)
        ))?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, content: &str) -> Option<Command> {
        let caps = self.pattern.captures(content.trim())?;
        let args = caps.get(2).map_or("", |m| m.as_str());

        match caps[1].to_ascii_lowercase().as_str() {
            PING_COMMAND => Some(Command::Ping),
            ASK_COMMAND | "ask" => Some(Command::Ask(args.to_string())),
            _ => None,
        }
    }
}

/// Slash commands registered with Discord on ready.
pub fn slash_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(ASK_COMMAND)
            .description("Ask the AI anything!")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    PROMPT_OPTION,
                    "Your question or prompt for the AI",
                )
                .required(true),
            ),
        CreateCommand::new(PING_COMMAND).description("Check if bot is alive"),
    ]
}

/// Map a slash command interaction to a `Command`.
pub fn from_interaction(command: &CommandInteraction) -> Option<Command> {
    match command.data.name.as_str() {
        PING_COMMAND => Some(Command::Ping),
        ASK_COMMAND => {
            let prompt = command
                .data
                .options
                .iter()
                .find(|o| o.name == PROMPT_OPTION)
                .and_then(|o| o.value.as_str())
                .unwrap_or_default();
            Some(Command::Ask(prompt.to_string()))
        }
        _ => None,
    }
}
