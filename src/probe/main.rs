//! Standalone probe for the listings page.
//!
//! Fetches and parses the listings page once, without any access check,
//! so the card selectors and link format can be checked against the
//! live markup.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use places_bot::config::BotSettings;
use places_bot::entitlement::EntitlementStore;
use places_bot::listings::{HttpPageSource, ListingFetcher, PageSource};

/// Listings page probe.
#[derive(Parser, Debug)]
#[command(name = "probe_listings")]
#[command(about = "Fetches the listings page once and prints the extracted venues")]
#[command(version)]
struct Args {
    /// Path to the settings JSON file.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listings URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Override the maximum number of venues shown.
    #[arg(long)]
    cap: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = args
        .config
        .as_deref()
        .map(|path| BotSettings::load_from_file(path));

    let mut settings = match loaded {
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            eprintln!("✗ Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
        None => BotSettings::default(),
    };

    if let Some(url) = args.url {
        settings.listings_url = url;
    }
    if let Some(cap) = args.cap {
        settings.result_cap = cap;
    }

    if let Err(e) = settings.validate() {
        eprintln!("✗ Invalid settings: {e}");
        return ExitCode::FAILURE;
    }

    probe(&settings).await
}

async fn probe(settings: &BotSettings) -> ExitCode {
    println!("Fetching: {}", settings.listings_url);
    println!(
        "Selectors: div.{} > a.{}\n",
        settings.card_class, settings.anchor_class
    );

    let source: Arc<dyn PageSource> = match HttpPageSource::new(settings.fetch_timeout()) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let fetcher =
        match ListingFetcher::from_settings(Arc::new(EntitlementStore::new()), source, settings) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                eprintln!("✗ {e}");
                return ExitCode::FAILURE;
            }
        };

    let records = match fetcher.fetch_records().await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("✗ Fetch failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if records.is_empty() {
        println!("✗ No venues extracted. The page markup may have changed.");
        return ExitCode::FAILURE;
    }

    let mut suspicious = 0;
    for (i, record) in records.iter().enumerate() {
        println!("{:>2}. {:?}", i + 1, record.name);
        println!("    {}", record.link);

        // origin + absolute href yields two schemes in one link
        if record.link.matches("://").count() > 1 {
            suspicious += 1;
            println!("    ⚠ Link looks doubled; the page may now serve absolute hrefs");
        }
    }

    println!("\n✓ Extracted {} venue(s)", records.len());
    if suspicious > 0 {
        println!("  ({suspicious} link(s) look malformed)");
    }

    ExitCode::SUCCESS
}
