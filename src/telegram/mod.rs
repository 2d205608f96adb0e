//! Telegram transport module.
//!
//! Receives messages through the Bot API and delivers command replies,
//! including inline payment buttons.

mod dispatcher;

pub use dispatcher::run_bot;
pub use teloxide::Bot;
