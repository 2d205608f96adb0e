//! Application settings and Telegram configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Telegram Bot API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub token: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self { token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `API_TOKEN` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token =
            std::env::var("API_TOKEN").map_err(|_| ConfigError::MissingEnvVar("API_TOKEN"))?;

        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        Ok(Self { token })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"***")
            .finish()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotSettings {
    /// Length of the trial granted on first contact, in days.
    #[serde(default = "default_trial_period_days")]
    pub trial_period_days: u32,

    /// Weekly price in dollars. Only shown in messages.
    #[serde(default = "default_price_per_week")]
    pub price_per_week: u32,

    /// Page that lists the venues.
    #[serde(default = "default_listings_url")]
    pub listings_url: String,

    /// Origin prepended to the relative hrefs found on the listings page.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// Class of the element wrapping one listing card.
    #[serde(default = "default_card_class")]
    pub card_class: String,

    /// Class of the anchor holding the venue name and link.
    #[serde(default = "default_anchor_class")]
    pub anchor_class: String,

    /// User-Agent sent with the listings request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Where the `/pay` button points.
    #[serde(default = "default_payment_link")]
    pub payment_link: String,

    /// Interval between expiry sweeps in seconds.
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_secs: u64,

    /// Maximum number of venues shown per request.
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    /// Upper bound on a single listings fetch in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_trial_period_days() -> u32 {
    2
}

fn default_price_per_week() -> u32 {
    10
}

fn default_listings_url() -> String {
    "https://www.tripadvisor.ru/Restaurants-g293915-Thailand.html".to_owned()
}

fn default_site_origin() -> String {
    "https://www.tripadvisor.ru".to_owned()
}

fn default_card_class() -> String {
    "_1llCuDZj".to_owned()
}

fn default_anchor_class() -> String {
    "_15_ydu6b".to_owned()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_owned()
}

fn default_payment_link() -> String {
    "https://your-payment-link.com".to_owned()
}

fn default_reaper_interval() -> u64 {
    3600 // one sweep per hour
}

fn default_result_cap() -> usize {
    10
}

fn default_fetch_timeout() -> u64 {
    10
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            trial_period_days: default_trial_period_days(),
            price_per_week: default_price_per_week(),
            listings_url: default_listings_url(),
            site_origin: default_site_origin(),
            card_class: default_card_class(),
            anchor_class: default_anchor_class(),
            user_agent: default_user_agent(),
            payment_link: default_payment_link(),
            reaper_interval_secs: default_reaper_interval(),
            result_cap: default_result_cap(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl BotSettings {
    /// Loads settings from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Saves settings to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Overrides fields from environment variables when they are set and parse.
    pub fn apply_env_overrides(&mut self) {
        if let Some(days) = env_parse("TRIAL_PERIOD_DAYS") {
            self.trial_period_days = days;
        }
        if let Some(price) = env_parse("PRICE_PER_WEEK") {
            self.price_per_week = price;
        }
        if let Ok(url) = std::env::var("LISTINGS_URL") {
            self.listings_url = url;
        }
        if let Ok(link) = std::env::var("PAYMENT_LINK") {
            self.payment_link = link;
        }
        if let Some(secs) = env_parse("REAPER_INTERVAL_SECS") {
            self.reaper_interval_secs = secs;
        }
        if let Some(secs) = env_parse("FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = secs;
        }
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.trial_period_days == 0 {
            return Err(SettingsError::ZeroValue("trial_period_days"));
        }
        if self.result_cap == 0 {
            return Err(SettingsError::ZeroValue("result_cap"));
        }
        if self.reaper_interval_secs == 0 {
            return Err(SettingsError::ZeroValue("reaper_interval_secs"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(SettingsError::ZeroValue("fetch_timeout_secs"));
        }

        for (field, value) in [
            ("listings_url", &self.listings_url),
            ("site_origin", &self.site_origin),
            ("payment_link", &self.payment_link),
        ] {
            Url::parse(value).map_err(|source| SettingsError::InvalidUrl {
                field,
                value: value.clone(),
                source,
            })?;
        }

        if self.card_class.trim().is_empty() {
            return Err(SettingsError::EmptyValue("card_class"));
        }
        if self.anchor_class.trim().is_empty() {
            return Err(SettingsError::EmptyValue("anchor_class"));
        }

        Ok(())
    }

    /// Trial length as a calendar duration.
    #[must_use]
    pub fn trial_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.trial_period_days))
    }

    /// Interval between expiry sweeps.
    #[must_use]
    pub const fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    /// Timeout for a single listings fetch.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Bot token is empty")]
    EmptyToken,
}

/// Errors raised while loading or validating [`BotSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Setting '{0}' must be greater than zero")]
    ZeroValue(&'static str),

    #[error("Setting '{0}' must not be empty")]
    EmptyValue(&'static str),

    #[error("Setting '{field}' is not a valid URL ({value}): {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },

    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] serde_json::Error),
}
