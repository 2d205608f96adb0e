//! Places Bot - Main Entry Point
//!
//! A Telegram bot that gives every new user a trial period and serves
//! venue listings while their access is valid.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use places_bot::commands::CommandHandler;
use places_bot::config::{BotSettings, TelegramConfig};
use places_bot::entitlement::{EntitlementStore, ExpiryReaper, ReaperMessage};
use places_bot::listings::{HttpPageSource, ListingFetcher, PageSource};
use places_bot::telegram::{Bot, run_bot};

/// Telegram bot with trial-gated venue listings.
#[derive(Parser, Debug)]
#[command(name = "places_bot")]
#[command(about = "Serve venue listings to users with a valid trial or subscription")]
#[command(version)]
struct Args {
    /// Path to the settings JSON file. Defaults are used when it does not exist.
    #[arg(short, long, default_value = "settings.json")]
    config: String,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate an example settings file and exit.
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    if args.generate_config {
        return generate_example_config();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = load_settings(&args.config)?;

    info!(
        "Settings loaded (trial: {} days, price: ${}/week, cap: {}, timeout: {}s)",
        settings.trial_period_days,
        settings.price_per_week,
        settings.result_cap,
        settings.fetch_timeout_secs
    );

    let store = Arc::new(EntitlementStore::new());

    let source: Arc<dyn PageSource> = Arc::new(
        HttpPageSource::new(settings.fetch_timeout()).context("Failed to build HTTP client")?,
    );
    let fetcher = ListingFetcher::from_settings(Arc::clone(&store), source, &settings)
        .context("Invalid listing selectors")?;

    let handler = Arc::new(CommandHandler::new(
        Arc::clone(&store),
        Arc::new(fetcher),
        &settings,
    ));

    // Spawn reaper task
    let (reaper_tx, reaper_rx) = mpsc::channel::<ReaperMessage>(8);
    let reaper = ExpiryReaper::new(Arc::clone(&store), settings.reaper_interval());
    let reaper_handle = tokio::spawn(async move {
        reaper.run(reaper_rx).await;
    });

    info!("Bot is running. Use Ctrl+C to stop.");
    run_bot(Bot::new(tg_config.token), handler).await;

    info!("Shutting down...");
    let _ = reaper_tx.send(ReaperMessage::Shutdown).await;
    let _ = reaper_handle.await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads settings from `path` if present, applies environment overrides and validates.
fn load_settings(path: &str) -> Result<BotSettings> {
    let mut settings = if Path::new(path).exists() {
        BotSettings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {path}"))?
    } else {
        debug!("Settings file {} not found, using defaults", path);
        BotSettings::default()
    };

    settings.apply_env_overrides();
    settings.validate().context("Settings validation failed")?;

    Ok(settings)
}

/// Generates an example settings file.
fn generate_example_config() -> Result<()> {
    BotSettings::default().save_to_file("settings.example.json")?;

    println!("✓ Example settings written to: settings.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy settings.example.json to settings.json");
    println!("2. Set payment_link and adjust the listing selectors if needed");
    println!("3. Create a .env file with API_TOKEN");
    println!("4. Run: places_bot");

    Ok(())
}
