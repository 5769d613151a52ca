//! Integration tests for remote-config gating and tag forwarding.
//!
//! These tests stand in for the site's static config resource and the tag
//! script origin with a mock server, verifying that forwarding activates
//! only on a fully successful bootstrap and degrades silently otherwise.

use folio_analytics::config::TrackerConfig;
use folio_analytics::page::{ClickTarget, PageContext};
use folio_analytics::storage::MemoryStore;
use folio_analytics::tag::{TagCommand, TagPipeline};
use folio_analytics::tracker::Tracker;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

/// Config pointing both network touches at the mock server.
fn test_config(server_uri: &str) -> TrackerConfig {
    TrackerConfig {
        config_url: Some(format!("{server_uri}/data/ga.json")),
        data_dir: std::env::temp_dir().join("folio-remote-test"),
        tag_origin: format!("{server_uri}/gtag/js"),
        tag_queue_size: 100,
    }
}

fn page() -> PageContext {
    PageContext {
        title: "Portfolio".to_string(),
        url: "https://example.dev/".to_string(),
        path: "/".to_string(),
        host: "example.dev".to_string(),
        fragment: None,
        referrer: Some("https://www.linkedin.com/feed/".to_string()),
    }
}

async fn mount_config(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/data/ga.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.to_string(), "application/json"),
        )
        .mount(server)
        .await;
}

async fn mount_script(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/gtag/js"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

// =============================================================================
// Successful Bootstrap
// =============================================================================

#[tokio::test]
async fn enabled_config_activates_forwarding() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": true, "measurementId": "G-INT1"}"#).await;
    mount_script(&server, 200).await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    assert!(tracker.tag().is_enabled());
    assert_eq!(tracker.tag().measurement_id(), Some("G-INT1"));

    // The bootstrap commands come first, in order.
    let commands: Vec<&TagCommand> = tracker.tag().commands().collect();
    assert!(matches!(commands[0], TagCommand::Js { .. }));
    assert!(
        matches!(commands[1], TagCommand::Config { measurement_id } if measurement_id == "G-INT1")
    );
}

#[tokio::test]
async fn page_view_and_traffic_source_are_forwarded() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": true, "measurementId": "G-INT1"}"#).await;
    mount_script(&server, 200).await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    let events: Vec<(&str, &serde_json::Value)> = tracker
        .tag()
        .commands()
        .filter_map(|c| match c {
            TagCommand::Event { name, params } => Some((name.as_str(), params)),
            _ => None,
        })
        .collect();

    let (_, page_view) = events
        .iter()
        .find(|(name, _)| *name == "page_view")
        .expect("page_view should be forwarded");
    assert_eq!(page_view["page_title"], "Portfolio");
    assert_eq!(page_view["visitor_id"], tracker.visitor_id());
    assert_eq!(page_view["page_path"], "/");

    let (_, traffic) = events
        .iter()
        .find(|(name, _)| *name == "traffic_source")
        .expect("traffic_source should be forwarded");
    assert_eq!(traffic["source"], "LinkedIn");
    assert_eq!(traffic["full_referrer"], "https://www.linkedin.com/feed/");
}

#[tokio::test]
async fn interactions_and_session_end_are_forwarded() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": true, "measurementId": "G-INT1"}"#).await;
    mount_script(&server, 200).await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    tracker.handle_click(&ClickTarget {
        tag: "A".to_string(),
        href: Some("mailto:me@example.dev".to_string()),
        text: Some("Email me".to_string()),
        regions: Vec::new(),
    });
    tracker.end_session();

    let names: Vec<&str> = tracker
        .tag()
        .commands()
        .filter_map(|c| match c {
            TagCommand::Event { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();

    assert!(names.contains(&"email_click"));
    assert!(names.contains(&"session_end"));

    let session_end = tracker
        .tag()
        .commands()
        .find_map(|c| match c {
            TagCommand::Event { name, params } if name == "session_end" => Some(params),
            _ => None,
        })
        .unwrap();
    assert!(session_end["session_duration_seconds"].is_u64());
    assert!(session_end["session_id"].is_string());
}

#[tokio::test]
async fn config_fetch_disables_caching() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/ga.json"))
        .and(header("cache-control", "no-store"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"enabled": false}"#.to_string(), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;
}

// =============================================================================
// Degraded Bootstrap
// =============================================================================

#[tokio::test]
async fn missing_config_resource_leaves_forwarding_off() {
    let server = MockServer::start().await;
    // No config mock mounted: the fetch gets a 404.
    mount_script(&server, 200).await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    assert!(!tracker.tag().is_enabled());
    assert_eq!(tracker.tag().queue_len(), 0);
    // Local counters still work.
    assert_eq!(tracker.state().page_views, 1);
}

#[tokio::test]
async fn malformed_config_leaves_forwarding_off() {
    let server = MockServer::start().await;
    mount_config(&server, "{ nope").await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    assert!(!tracker.tag().is_enabled());
}

#[tokio::test]
async fn disabled_flag_skips_script_load() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": false, "measurementId": "G-INT1"}"#).await;

    // The script origin must never be contacted.
    Mock::given(method("GET"))
        .and(path("/gtag/js"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    assert!(!tracker.tag().is_enabled());
}

#[tokio::test]
async fn enabled_without_measurement_id_skips_script_load() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": true}"#).await;

    Mock::given(method("GET"))
        .and(path("/gtag/js"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    tracker.init(page()).await;

    assert!(!tracker.tag().is_enabled());
}

#[tokio::test]
async fn failed_script_load_resolves_with_forwarding_off() {
    let server = MockServer::start().await;
    mount_config(&server, r#"{"enabled": true, "measurementId": "G-INT1"}"#).await;
    mount_script(&server, 500).await;

    let mut tracker = Tracker::new(test_config(&server.uri()), MemoryStore::new()).unwrap();
    // Must return normally despite the failed script fetch.
    tracker.init(page()).await;

    assert!(!tracker.tag().is_enabled());
    assert_eq!(tracker.state().page_views, 1);
}

// =============================================================================
// Script Load Idempotence
// =============================================================================

#[tokio::test]
async fn script_load_is_idempotent_per_measurement_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gtag/js"))
        .and(query_param("id", "G-INT1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = TagPipeline::new(format!("{}/gtag/js", server.uri()), 100);
    pipeline.load("G-INT1").await;
    pipeline.load("G-INT1").await;
    pipeline.load("G-INT1").await;

    assert!(pipeline.is_enabled());
    // Exactly one js + one config command despite three load calls.
    assert_eq!(pipeline.queue_len(), 2);
}
