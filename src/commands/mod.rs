//! Command handling module.
//!
//! Turns slash commands sent to the bot into replies, granting trials
//! and running the gated listings fetch.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandResult, LinkButton};
