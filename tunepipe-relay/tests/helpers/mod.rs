//! Test helper modules for tunepipe-relay integration tests
//!
//! - ResolverStub: in-process stand-in for the audio resolution service
//! - FakeTranscoder: shell scripts that honor the transcoder's stdout contract
//! - request/response helpers for driving the router with `oneshot`

#![allow(dead_code, unused_imports)]

#[cfg(unix)]
pub mod fake_transcoder;
pub mod resolver_stub;

#[cfg(unix)]
pub use fake_transcoder::FakeTranscoder;
pub use resolver_stub::ResolverStub;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use tunepipe_common::Config;
use tunepipe_relay::{build_router, AppState};

/// Config pointing at the given resolver and transcoder
pub fn test_config(resolver_url: &str, transcoder: &Path) -> Config {
    Config {
        resolver_url: resolver_url.to_string(),
        transcoder_path: transcoder.to_path_buf(),
        ..Config::default()
    }
}

/// Router over a fresh AppState
pub fn setup_app(config: Config) -> axum::Router {
    let state = AppState::new(config).expect("Should build app state");
    build_router(state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect the whole body
pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect()
        .await
        .expect("Should read body")
        .to_bytes()
        .to_vec()
}

/// Collect and parse a JSON body
pub async fn extract_json(body: Body) -> Value {
    let bytes = body_bytes(body).await;
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
