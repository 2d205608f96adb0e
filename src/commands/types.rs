//! Command types and definitions.

use std::fmt;

use crate::listings::PriceSegment;

/// Available bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the user and grant a trial when they have no valid access.
    Start,

    /// Fetch the venue listings.
    Places(PriceSegment),

    /// Show how to pay for access.
    Pay,

    /// Show when access expires.
    Status,

    /// Show help information.
    Help,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts an optional `@botname` suffix on the command word.
    /// Returns `None` if the message is not a known command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/')?;

        let cmd = match word.split_once('@') {
            Some((cmd, _bot)) => cmd,
            None => word,
        }
        .to_lowercase();

        match cmd.as_str() {
            "start" => Some(Self::Start),
            "places" | "budget" => Some(Self::Places(PriceSegment::Budget)),
            "medium" => Some(Self::Places(PriceSegment::Medium)),
            "premium" => Some(Self::Places(PriceSegment::Premium)),
            "pay" | "subscribe" => Some(Self::Pay),
            "status" => Some(Self::Status),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Places(PriceSegment::Budget) => "budget",
            Self::Places(PriceSegment::Medium) => "medium",
            Self::Places(PriceSegment::Premium) => "premium",
            Self::Pay => "pay",
            Self::Status => "status",
            Self::Help => "help",
        }
    }

    /// Returns all available commands with their aliases and descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("/start", "", "Start and get trial access"),
            ("/budget", "(/places)", "Best budget places"),
            ("/medium", "", "Best mid-range places"),
            ("/premium", "", "Best premium places"),
            ("/pay", "(/subscribe)", "How to pay for access"),
            ("/status", "", "Show when your access expires"),
            ("/help", "", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Inline button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Whether `message` is Telegram HTML.
    pub html: bool,

    /// Optional button sent along with the message.
    pub button: Option<LinkButton>,
}

impl CommandResult {
    /// Creates a successful plain-text result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            html: false,
            button: None,
        }
    }

    /// Creates a successful HTML result.
    #[must_use]
    pub fn success_html(message: impl Into<String>) -> Self {
        Self {
            html: true,
            ..Self::success(message)
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(message)
        }
    }

    /// Attaches a URL button.
    #[must_use]
    pub fn with_button(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.button = Some(LinkButton {
            label: label.into(),
            url: url.into(),
        });
        self
    }
}
