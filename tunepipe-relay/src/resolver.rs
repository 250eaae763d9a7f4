//! Resolution service client
//!
//! Forwards a source URL to `POST {resolver}/get-audio` and returns the
//! playable tracks it reports. One request per call, no retries.

use std::time::Duration;

use thiserror::Error;
use tunepipe_common::api::types::{required_url, ResolveRequest, ResolveResponse};
use tunepipe_common::{Config, Track};

const USER_AGENT: &str = concat!("tunepipe-relay/", env!("CARGO_PKG_VERSION"));

/// Resolver client errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No playable tracks found")]
    NoTracksFound,

    #[error("Resolution service unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// HTTP client for the audio resolution service
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl ResolverClient {
    pub fn new(config: &Config) -> tunepipe_common::Result<Self> {
        Self::with_endpoint(config.resolver_endpoint(), config.resolver_timeout)
    }

    pub fn with_endpoint(endpoint: String, timeout: Duration) -> tunepipe_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| tunepipe_common::Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve a source URL into an ordered list of playable tracks
    ///
    /// Tracks without a URL are dropped. An empty result is reported as
    /// [`ResolveError::NoTracksFound`], never as an empty success.
    pub async fn resolve(&self, source_url: &str) -> Result<Vec<Track>, ResolveError> {
        let source_url = required_url("url", Some(source_url))
            .map_err(|_| ResolveError::InvalidInput("url is required".to_string()))?;

        tracing::debug!(source = %source_url, endpoint = %self.endpoint, "Resolving source URL");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&ResolveRequest {
                url: source_url.to_string(),
            })
            .send()
            .await
            .map_err(|e| ResolveError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResolveError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::UpstreamUnavailable(format!("Invalid response: {}", e)))?;

        let reported = body.tracks.unwrap_or_default();
        let reported_count = reported.len();

        let tracks: Vec<Track> = reported.into_iter().filter(Track::is_playable).collect();

        if tracks.len() < reported_count {
            tracing::warn!(
                dropped = reported_count - tracks.len(),
                "Resolver returned tracks without a playable URL"
            );
        }

        if tracks.is_empty() {
            return Err(ResolveError::NoTracksFound);
        }

        tracing::info!(source = %source_url, tracks = tracks.len(), "Resolved source URL");

        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_source_fails_before_any_request() {
        // Port 9 (discard) would fail with UpstreamUnavailable if contacted
        let client = ResolverClient::with_endpoint(
            "http://127.0.0.1:9/get-audio".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert!(matches!(client.resolve("").await, Err(ResolveError::InvalidInput(_))));
        assert!(matches!(client.resolve("  ").await, Err(ResolveError::InvalidInput(_))));
    }

    #[test]
    fn test_endpoint_from_config() {
        let client = ResolverClient::new(&Config::default()).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:5050/get-audio");
    }
}
