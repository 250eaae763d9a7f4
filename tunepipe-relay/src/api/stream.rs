//! Audio streaming endpoint
//!
//! `GET /stream?url=...` spawns a transcoder for the playable URL and streams
//! its MP3 output as the response body. Once headers are sent a transcoder
//! failure can only end the body early; it is logged, not reported.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_TYPE, RANGE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tunepipe_common::api::types::{required_url, StreamQuery};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const AUDIO_MPEG: &str = "audio/mpeg";

/// GET /stream
///
/// `Accept-Ranges: bytes` is advertised for player compatibility, but the
/// transcoder output cannot be seeked: `Range` requests are answered with the
/// full stream and a 200.
pub async fn stream_audio(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let url = required_url("url", query.url.as_deref())?;

    if let Some(range) = headers.get(RANGE) {
        tracing::debug!(range = ?range, "Ignoring Range header, transcoded stream is not seekable");
    }

    let stream = state.transcoder.spawn(url).map_err(|e| {
        tracing::error!(url = %url, "Failed to start transcoder: {}", e);
        ApiError::from(e)
    })?;

    tracing::debug!(stream_id = %stream.stream_id(), "Streaming transcoder output");

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(AUDIO_MPEG)),
            (ACCEPT_RANGES, HeaderValue::from_static("bytes")),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
