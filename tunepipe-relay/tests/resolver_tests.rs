//! Integration tests for ResolverClient against an in-process resolution service

mod helpers;

use axum::http::StatusCode;
use helpers::resolver_stub::unreachable_base_url;
use helpers::ResolverStub;
use serde_json::json;
use std::time::Duration;
use tunepipe_common::Track;
use tunepipe_relay::resolver::{ResolveError, ResolverClient};

fn client_for(base_url: &str) -> ResolverClient {
    ResolverClient::with_endpoint(format!("{}/get-audio", base_url), Duration::from_secs(5))
        .expect("Should build client")
}

#[tokio::test]
async fn test_resolve_returns_tracks_in_order() {
    let stub = ResolverStub::with_tracks(json!([
        {"title": "One", "url": "https://cdn/1"},
        {"title": "Two", "url": "https://cdn/2"}
    ]))
    .await;

    let tracks = client_for(&stub.base_url())
        .resolve("https://youtu.be/abc")
        .await
        .unwrap();

    assert_eq!(
        tracks,
        vec![Track::new("One", "https://cdn/1"), Track::new("Two", "https://cdn/2")]
    );
}

#[tokio::test]
async fn test_resolve_trims_source_url() {
    let stub = ResolverStub::with_tracks(json!([{"title": "One", "url": "https://cdn/1"}])).await;

    client_for(&stub.base_url())
        .resolve("  https://youtu.be/abc\n")
        .await
        .unwrap();

    assert_eq!(stub.received(), vec![json!({"url": "https://youtu.be/abc"})]);
}

#[tokio::test]
async fn test_resolve_empty_is_no_tracks_found() {
    let stub = ResolverStub::with_tracks(json!([])).await;

    let result = client_for(&stub.base_url()).resolve("https://youtu.be/abc").await;

    assert!(matches!(result, Err(ResolveError::NoTracksFound)));
}

#[tokio::test]
async fn test_resolve_http_error_is_upstream_unavailable() {
    let stub = ResolverStub::start(StatusCode::BAD_GATEWAY, json!({"error": "boom"})).await;

    let result = client_for(&stub.base_url()).resolve("https://youtu.be/abc").await;

    match result {
        Err(ResolveError::UpstreamUnavailable(detail)) => assert!(detail.contains("502")),
        other => panic!("Expected UpstreamUnavailable, got {:?}", other),
    }
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_resolve_connection_refused_is_upstream_unavailable() {
    let base_url = unreachable_base_url().await;

    let result = client_for(&base_url).resolve("https://youtu.be/abc").await;

    assert!(matches!(result, Err(ResolveError::UpstreamUnavailable(_))));
}
