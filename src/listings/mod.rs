//! Venue listings module.
//!
//! Fetches the listings page, extracts venue cards and renders them
//! for delivery, but only for users whose access is still valid.

mod fetcher;
mod parser;
mod render;
mod source;

pub use fetcher::{FetchOptions, ListingFetcher, ListingOutcome, ListingReply, PriceSegment};
pub use parser::{ClassSelectorParser, ListingParser, ParserError, VenueRecord};
pub use render::render_listings;
pub use source::{FetchError, HttpPageSource, PageRequest, PageResponse, PageSource};

#[cfg(test)]
pub(crate) use fetcher::tests as test_support;
