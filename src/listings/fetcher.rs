//! Gated listings pipeline: entitlement check, fetch, parse, render.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{
    ClassSelectorParser, FetchError, ListingParser, PageRequest, PageSource, ParserError,
    VenueRecord, render_listings,
};
use crate::config::BotSettings;
use crate::entitlement::{EntitlementStore, UserId};

/// Price segment a user asked for.
///
/// Only labels the result header; the source page is not filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSegment {
    #[default]
    Budget,
    Medium,
    Premium,
}

impl PriceSegment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Medium => "medium",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for PriceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a listings request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOutcome {
    /// Records were found and rendered.
    Success,
    /// The user is not entitled; nothing was fetched.
    Denied,
    /// The fetch failed or returned a non-success status.
    FetchFailed,
    /// The page was fetched but held no usable cards.
    Empty,
}

/// Rendered answer to a listings request.
#[derive(Debug, Clone)]
pub struct ListingReply {
    pub outcome: ListingOutcome,
    /// User-facing text. HTML when the outcome is [`ListingOutcome::Success`].
    pub text: String,
    pub records: Vec<VenueRecord>,
}

impl ListingReply {
    fn without_records(outcome: ListingOutcome, text: String) -> Self {
        Self {
            outcome,
            text,
            records: Vec::new(),
        }
    }
}

/// Request parameters that do not change between calls.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub listings_url: String,
    pub user_agent: String,
    pub result_cap: usize,
    pub price_per_week: u32,
}

impl From<&BotSettings> for FetchOptions {
    fn from(settings: &BotSettings) -> Self {
        Self {
            listings_url: settings.listings_url.clone(),
            user_agent: settings.user_agent.clone(),
            result_cap: settings.result_cap,
            price_per_week: settings.price_per_week,
        }
    }
}

/// Fetches one page of venue listings for entitled users.
pub struct ListingFetcher {
    store: Arc<EntitlementStore>,
    source: Arc<dyn PageSource>,
    parser: Box<dyn ListingParser>,
    options: FetchOptions,
}

impl ListingFetcher {
    /// Creates a new fetcher.
    #[must_use]
    pub fn new(
        store: Arc<EntitlementStore>,
        source: Arc<dyn PageSource>,
        parser: Box<dyn ListingParser>,
        options: FetchOptions,
    ) -> Self {
        Self {
            store,
            source,
            parser,
            options,
        }
    }

    /// Creates a fetcher using the class-based parser described by `settings`.
    pub fn from_settings(
        store: Arc<EntitlementStore>,
        source: Arc<dyn PageSource>,
        settings: &BotSettings,
    ) -> Result<Self, ParserError> {
        let parser = ClassSelectorParser::new(
            &settings.card_class,
            &settings.anchor_class,
            settings.site_origin.clone(),
        )?;

        Ok(Self::new(store, source, Box::new(parser), settings.into()))
    }

    /// Runs the full pipeline for `user` at time `now`.
    ///
    /// The entitlement check happens before any request is made. Failures
    /// are turned into a reply and never returned as errors.
    pub async fn fetch_listings(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        segment: PriceSegment,
    ) -> ListingReply {
        if !self.store.is_entitled(user, now).await {
            debug!("User {} is not entitled, skipping fetch", user);
            return ListingReply::without_records(ListingOutcome::Denied, self.denied_message());
        }

        let records = match self.fetch_records().await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to fetch listings for user {}: {}", user, e);
                return ListingReply::without_records(
                    ListingOutcome::FetchFailed,
                    FETCH_FAILED_MESSAGE.to_owned(),
                );
            }
        };

        if records.is_empty() {
            info!("No listings found for user {}", user);
            return ListingReply::without_records(
                ListingOutcome::Empty,
                EMPTY_MESSAGE.to_owned(),
            );
        }

        info!("Sending {} listings to user {}", records.len(), user);
        let header = format!("Best places in the '{segment}' segment:");
        ListingReply {
            outcome: ListingOutcome::Success,
            text: render_listings(&header, &records),
            records,
        }
    }

    /// Fetches and parses the listings page without any entitlement check.
    ///
    /// Returns at most `result_cap` records in page order.
    pub async fn fetch_records(&self) -> Result<Vec<VenueRecord>, FetchError> {
        let request = PageRequest::get(&self.options.listings_url)
            .with_header("User-Agent", &self.options.user_agent);

        let response = self.source.get(&request).await?;
        if !response.is_ok() {
            return Err(FetchError::Status(response.status));
        }

        let mut records = self.parser.parse(&response.body);
        records.truncate(self.options.result_cap);
        Ok(records)
    }

    /// Message shown to users whose access has run out.
    #[must_use]
    pub fn denied_message(&self) -> String {
        format!(
            "Your trial period has expired. To continue, pay for access: ${} for 7 days.",
            self.options.price_per_week
        )
    }
}

impl fmt::Debug for ListingFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingFetcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

const FETCH_FAILED_MESSAGE: &str = "Could not load places right now. Please try again later.";
const EMPTY_MESSAGE: &str = "Sorry, nothing was found.";
