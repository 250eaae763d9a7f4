//! Shared API request/response types
//!
//! Covers both surfaces the relay speaks:
//! - the client-facing API (`/play`, `/stream`)
//! - the resolution service wire format (`POST /get-audio`)

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ========================================
// Track
// ========================================

/// A playable track returned by the resolution service
///
/// Tracks carry no identity beyond their position in the resolved list and are
/// passed back to the client byte-for-byte.
///
/// # Examples
///
/// ```
/// use tunepipe_common::Track;
///
/// let track: Track = serde_json::from_str(r#"{"title":"Song A","url":"https://cdn/a.m3u8"}"#).unwrap();
/// assert_eq!(track.title, "Song A");
/// assert_eq!(track.url, "https://cdn/a.m3u8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Track {
    /// Display title (empty when the resolver omits it)
    #[serde(default)]
    pub title: String,

    /// Opaque playable media URL
    pub url: String,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// A track is usable when it has something to stream
    pub fn is_playable(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

// ========================================
// Resolution Service Wire Types
// ========================================

/// Body of `POST {resolver}/get-audio`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveRequest {
    pub url: String,
}

/// Response of `POST {resolver}/get-audio`
///
/// `tracks` may be absent or `null`; both mean nothing was resolved.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
}

// ========================================
// Client-facing API Types
// ========================================

/// Body of `POST /play` (JSON or urlencoded form)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful `POST /play` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayResponse {
    pub tracks: Vec<Track>,
}

/// Query string of `GET /stream`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,

    /// Machine-readable code (e.g. `BAD_REQUEST`, `NO_TRACKS`)
    pub code: String,
}

/// Extract a required, non-blank URL field
///
/// Whitespace-only values count as missing. The returned slice is trimmed.
pub fn required_url<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(Error::InvalidInput(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_url_accepts_value() {
        assert_eq!(required_url("url", Some("https://x/y")).unwrap(), "https://x/y");
        assert_eq!(required_url("url", Some("  https://x/y \n")).unwrap(), "https://x/y");
    }

    #[test]
    fn test_required_url_rejects_missing_and_blank() {
        assert!(matches!(required_url("url", None), Err(Error::InvalidInput(_))));
        assert!(matches!(required_url("url", Some("")), Err(Error::InvalidInput(_))));
        assert!(matches!(required_url("url", Some("   ")), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_response_tolerates_missing_and_null_tracks() {
        let missing: ResolveResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.tracks.is_none());

        let null: ResolveResponse = serde_json::from_str(r#"{"tracks":null}"#).unwrap();
        assert!(null.tracks.is_none());
    }

    #[test]
    fn test_track_without_title_defaults_to_empty() {
        let track: Track = serde_json::from_str(r#"{"url":"https://cdn/a"}"#).unwrap();
        assert_eq!(track.title, "");
        assert!(track.is_playable());
    }

    #[test]
    fn test_track_with_blank_url_is_not_playable() {
        assert!(!Track::new("Silent", " ").is_playable());
    }

    #[test]
    fn test_track_serializes_exact_fields() {
        let json = serde_json::to_value(Track::new("Song A", "https://cdn/a.m3u8")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Song A", "url": "https://cdn/a.m3u8"})
        );
    }
}
