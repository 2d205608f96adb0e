//! Command handler implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::types::{BotCommand, CommandResult};
use crate::config::BotSettings;
use crate::entitlement::{EntitlementStore, UserId};
use crate::listings::{ListingFetcher, ListingOutcome, PriceSegment};

/// Handles bot commands on behalf of individual users.
pub struct CommandHandler {
    /// Shared entitlement state.
    store: Arc<EntitlementStore>,

    /// Gated listings pipeline.
    fetcher: Arc<ListingFetcher>,

    /// Length of a newly granted trial.
    trial_period: chrono::Duration,

    trial_period_days: u32,

    price_per_week: u32,

    payment_link: String,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        store: Arc<EntitlementStore>,
        fetcher: Arc<ListingFetcher>,
        settings: &BotSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            trial_period: settings.trial_period(),
            trial_period_days: settings.trial_period_days,
            price_per_week: settings.price_per_week,
            payment_link: settings.payment_link.clone(),
        }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, user: UserId, message_text: &str) -> Option<CommandResult> {
        self.try_handle_at(user, message_text, Utc::now()).await
    }

    /// Same as [`Self::try_handle`] with an explicit clock reading.
    pub async fn try_handle_at(
        &self,
        user: UserId,
        message_text: &str,
        now: DateTime<Utc>,
    ) -> Option<CommandResult> {
        let command = BotCommand::parse(message_text)?;

        debug!("Handling command {} from user {}", command, user);
        let result = self.execute(user, command, now).await;
        info!(
            "Command {} for user {}: success={}",
            command, user, result.success
        );

        Some(result)
    }

    /// Executes a parsed command.
    async fn execute(&self, user: UserId, command: BotCommand, now: DateTime<Utc>) -> CommandResult {
        match command {
            BotCommand::Start => self.handle_start(user, now).await,
            BotCommand::Places(segment) => self.handle_places(user, now, segment).await,
            BotCommand::Pay => self.handle_pay(),
            BotCommand::Status => self.handle_status(user, now).await,
            BotCommand::Help => Self::handle_help(),
        }
    }

    // An expired user is indistinguishable from a new one here, so they
    // get a fresh trial.
    async fn handle_start(&self, user: UserId, now: DateTime<Utc>) -> CommandResult {
        if self.store.is_entitled(user, now).await {
            return CommandResult::success(
                "Welcome back! You can search for the best places in Thailand.",
            );
        }

        let expires_at = self.store.grant_trial(user, now, self.trial_period).await;
        info!("Granted trial to user {} until {}", user, expires_at);

        CommandResult::success(format!(
            "Welcome! You have {} days of trial access.",
            self.trial_period_days
        ))
    }

    async fn handle_places(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        segment: PriceSegment,
    ) -> CommandResult {
        let reply = self.fetcher.fetch_listings(user, now, segment).await;

        match reply.outcome {
            ListingOutcome::Success => CommandResult::success_html(reply.text),
            ListingOutcome::Empty => CommandResult::success(reply.text),
            ListingOutcome::Denied | ListingOutcome::FetchFailed => {
                CommandResult::error(reply.text)
            }
        }
    }

    fn handle_pay(&self) -> CommandResult {
        CommandResult::success(format!(
            "To extend access, pay ${} for 7 days.",
            self.price_per_week
        ))
        .with_button(format!("Pay ${}", self.price_per_week), &self.payment_link)
    }

    async fn handle_status(&self, user: UserId, now: DateTime<Utc>) -> CommandResult {
        match self.store.expires_at(user).await {
            Some(expires_at) if now < expires_at => {
                let remaining = (expires_at - now).num_seconds().unsigned_abs();
                CommandResult::success(format!(
                    "Your access is active until {} ({} left).",
                    expires_at.format("%Y-%m-%d %H:%M UTC"),
                    format_duration(remaining)
                ))
            }
            Some(expires_at) => CommandResult::error(format!(
                "Your access expired on {}. Use /pay to extend it.",
                expires_at.format("%Y-%m-%d %H:%M UTC")
            )),
            None => CommandResult::error("You have no access yet. Send /start to begin your trial."),
        }
    }

    fn handle_help() -> CommandResult {
        let mut lines = vec!["Places Bot Commands".to_owned(), String::new()];

        for (cmd, aliases, desc) in BotCommand::all_commands() {
            let alias_str = if aliases.is_empty() {
                String::new()
            } else {
                format!(" {aliases}")
            };
            lines.push(format!("  {cmd}{alias_str} - {desc}"));
        }

        CommandResult::success(lines.join("\n"))
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("trial_period_days", &self.trial_period_days)
            .field("price_per_week", &self.price_per_week)
            .finish_non_exhaustive()
    }
}

/// Formats a duration in seconds to a human-readable string.
fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        if hours == 0 {
            format!("{days}d")
        } else {
            format!("{days}d {hours}h")
        }
    } else if hours > 0 {
        if mins == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {mins}m")
        }
    } else if mins > 0 {
        format!("{mins}m")
    } else {
        format!("{secs}s")
    }
}
