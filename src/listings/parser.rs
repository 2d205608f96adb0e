//! Extraction of venue records from a listings page.
//!
//! The page structure is an external contract that changes without
//! notice, so matching lives behind [`ListingParser`].

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One venue taken from the listings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRecord {
    /// Display name exactly as it appears in the markup.
    pub name: String,
    /// Absolute link to the venue page.
    pub link: String,
}

impl VenueRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

/// Errors raised while building a parser.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Turns an HTML document into venue records in document order.
pub trait ListingParser: Send + Sync {
    fn parse(&self, html: &str) -> Vec<VenueRecord>;
}

/// Matches `div` cards by class and the name anchor inside each by class.
///
/// Links are built as `origin + href`. The listings site serves relative
/// hrefs; an absolute href would produce a broken link.
#[derive(Debug)]
pub struct ClassSelectorParser {
    card: Selector,
    anchor: Selector,
    origin: String,
}

impl ClassSelectorParser {
    pub fn new(
        card_class: &str,
        anchor_class: &str,
        origin: impl Into<String>,
    ) -> Result<Self, ParserError> {
        Ok(Self {
            card: class_selector("div", card_class)?,
            anchor: class_selector("a", anchor_class)?,
            origin: origin.into(),
        })
    }

    fn extract(&self, card: ElementRef<'_>) -> Option<VenueRecord> {
        let anchor = card.select(&self.anchor).next()?;
        let href = anchor.value().attr("href")?;
        let name: String = anchor.text().collect();

        if name.is_empty() {
            return None;
        }

        Some(VenueRecord {
            name,
            link: format!("{}{}", self.origin, href),
        })
    }
}

impl ListingParser for ClassSelectorParser {
    fn parse(&self, html: &str) -> Vec<VenueRecord> {
        let document = Html::parse_document(html);

        let mut records = Vec::new();
        for (index, card) in document.select(&self.card).enumerate() {
            match self.extract(card) {
                Some(record) => records.push(record),
                None => debug!("Skipping listing card {} without a usable name link", index),
            }
        }

        records
    }
}

fn class_selector(element: &str, class: &str) -> Result<Selector, ParserError> {
    let selector = format!("{element}.{class}");
    Selector::parse(&selector).map_err(|e| ParserError::InvalidSelector {
        selector: selector.clone(),
        message: e.to_string(),
    })
}
