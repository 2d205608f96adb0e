use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use httpmock::prelude::*;
use places_bot::commands::CommandHandler;
use places_bot::config::BotSettings;
use places_bot::entitlement::{EntitlementStore, ExpiryReaper};
use places_bot::listings::{
    HttpPageSource, ListingFetcher, ListingOutcome, PageSource, PriceSegment,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn listing_page(count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(
                r#"<div class="_1llCuDZj"><div class="img"></div><a class="_15_ydu6b" href="/Restaurant_Review-d{i}.html">Place {i}</a></div>"#
            )
        })
        .collect();
    format!("<!DOCTYPE html><html><head><title>Thailand</title></head><body>{cards}</body></html>")
}

fn settings_for(server: &MockServer) -> BotSettings {
    BotSettings {
        listings_url: server.url("/Restaurants-g293915-Thailand.html"),
        site_origin: "https://www.tripadvisor.ru".to_owned(),
        fetch_timeout_secs: 5,
        ..BotSettings::default()
    }
}

fn build(settings: &BotSettings, store: &Arc<EntitlementStore>) -> ListingFetcher {
    let source: Arc<dyn PageSource> =
        Arc::new(HttpPageSource::new(settings.fetch_timeout()).unwrap());
    ListingFetcher::from_settings(Arc::clone(store), source, settings).unwrap()
}

#[tokio::test]
async fn test_trial_user_gets_listings_over_http() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/Restaurants-g293915-Thailand.html");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(listing_page(2));
        })
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(EntitlementStore::new());
    let fetcher = Arc::new(build(&settings, &store));
    let handler = CommandHandler::new(Arc::clone(&store), fetcher, &settings);

    let start = handler.try_handle_at(1, "/start", t0()).await.unwrap();
    assert!(start.success);

    let places = handler
        .try_handle_at(1, "/places", t0() + chrono::Duration::hours(1))
        .await
        .unwrap();

    page.assert_async().await;
    assert!(places.html);
    let lines: Vec<&str> = places
        .message
        .lines()
        .filter(|l| l.starts_with("• "))
        .collect();
    assert_eq!(
        lines,
        vec![
            "• <a href=\"https://www.tripadvisor.ru/Restaurant_Review-d1.html\">Place 1</a>",
            "• <a href=\"https://www.tripadvisor.ru/Restaurant_Review-d2.html\">Place 2</a>",
        ]
    );
}

#[tokio::test]
async fn test_unknown_user_never_reaches_server() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(listing_page(3));
        })
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(EntitlementStore::new());
    let fetcher = build(&settings, &store);

    let reply = fetcher.fetch_listings(2, t0(), PriceSegment::Budget).await;

    assert_eq!(reply.outcome, ListingOutcome::Denied);
    assert_eq!(page.hits_async().await, 0);
}

#[tokio::test]
async fn test_server_error_is_reported_as_fetch_failure() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(500).body("Internal Server Error");
        })
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(EntitlementStore::new());
    store.grant_trial(1, t0(), settings.trial_period()).await;
    let fetcher = build(&settings, &store);

    let reply = fetcher.fetch_listings(1, t0(), PriceSegment::Budget).await;

    assert_eq!(page.hits_async().await, 1);
    assert_eq!(reply.outcome, ListingOutcome::FetchFailed);
    assert!(reply.records.is_empty());
    assert!(reply.text.contains("try again later"));
}

#[tokio::test]
async fn test_fifteen_cards_are_cut_to_ten() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(listing_page(15));
        })
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(EntitlementStore::new());
    store.grant_trial(1, t0(), settings.trial_period()).await;
    let fetcher = build(&settings, &store);

    let reply = fetcher.fetch_listings(1, t0(), PriceSegment::Budget).await;

    assert_eq!(reply.outcome, ListingOutcome::Success);
    let names: Vec<&str> = reply.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Place 1", "Place 2", "Place 3", "Place 4", "Place 5", "Place 6", "Place 7",
            "Place 8", "Place 9", "Place 10",
        ]
    );
}

#[tokio::test]
async fn test_slow_upstream_hits_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200)
                .delay(Duration::from_secs(3))
                .body(listing_page(1));
        })
        .await;

    let settings = BotSettings {
        fetch_timeout_secs: 1,
        ..settings_for(&server)
    };
    let store = Arc::new(EntitlementStore::new());
    store.grant_trial(1, t0(), settings.trial_period()).await;
    let fetcher = build(&settings, &store);

    let reply = fetcher.fetch_listings(1, t0(), PriceSegment::Budget).await;
    assert_eq!(reply.outcome, ListingOutcome::FetchFailed);
}

#[tokio::test]
async fn test_reaped_user_is_denied_without_request() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(listing_page(1));
        })
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(EntitlementStore::new());
    store.grant_trial(1, t0(), settings.trial_period()).await;

    let later = t0() + chrono::Duration::days(3);
    let reaper = ExpiryReaper::new(Arc::clone(&store), settings.reaper_interval());
    assert_eq!(reaper.sweep(later).await, 1);

    let fetcher = build(&settings, &store);
    let reply = fetcher.fetch_listings(1, later, PriceSegment::Budget).await;

    assert_eq!(reply.outcome, ListingOutcome::Denied);
    assert_eq!(page.hits_async().await, 0);
}
