//! tunepipe-relay library
//!
//! Resolves source URLs through an external resolution service and streams
//! each resolved track back to the client as MP3 transcoded on the fly.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tunepipe_common::Config;

pub mod api;
pub mod error;
pub mod resolver;
pub mod transcoder;

use resolver::ResolverClient;
use transcoder::Transcoder;

/// Application state shared across HTTP handlers
///
/// Everything here is immutable after startup; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Arc<Config>,
    /// Resolution service client (pooled connections)
    pub resolver: ResolverClient,
    /// Per-request transcoder launcher
    pub transcoder: Transcoder,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> tunepipe_common::Result<Self> {
        let resolver = ResolverClient::new(&config)?;
        let transcoder = Transcoder::from_config(&config);

        Ok(Self {
            config: Arc::new(config),
            resolver,
            transcoder,
        })
    }
}

/// Build application router
///
/// Every response carries `Access-Control-Allow-Origin: *` so the player page
/// and third-party `<audio>` elements can fetch streams cross-origin.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::serve_index))
        .route("/play", post(api::play))
        .route("/stream", get(api::stream_audio))
        .route("/build_info", get(api::get_build_info))
        .merge(api::health_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
        .layer(TraceLayer::new_for_http())
}
