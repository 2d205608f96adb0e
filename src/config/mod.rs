//! Configuration module for the places bot.
//!
//! Handles loading and validation of the bot settings and the
//! Telegram API credentials.

mod settings;

pub use settings::{BotSettings, ConfigError, SettingsError, TelegramConfig};
