//! Track resolution endpoint
//!
//! `POST /play` forwards the submitted source URL to the resolution service
//! and returns the playable tracks in the order the service reported them.

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use tunepipe_common::api::types::{required_url, PlayRequest, PlayResponse};

use crate::error::{ApiError, ApiResult};
use crate::resolver::ResolveError;
use crate::AppState;

/// `POST /play` body, accepted as JSON or as an urlencoded form
#[derive(Debug)]
pub struct PlayPayload(pub PlayRequest);

#[async_trait]
impl<S> FromRequest<S> for PlayPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            let Form(body) = Form::<PlayRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<PlayRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self(body))
        }
    }
}

/// POST /play
///
/// 400 when `url` is missing, 404 when nothing playable was resolved,
/// 500 when the resolution service fails.
pub async fn play(
    State(state): State<AppState>,
    PlayPayload(request): PlayPayload,
) -> ApiResult<Json<PlayResponse>> {
    let source_url = required_url("url", request.url.as_deref())?;

    let tracks = state.resolver.resolve(source_url).await.map_err(|e| {
        match &e {
            ResolveError::UpstreamUnavailable(detail) => {
                tracing::error!(source = %source_url, "Resolver request failed: {}", detail);
            }
            ResolveError::NoTracksFound => {
                tracing::info!(source = %source_url, "Resolver returned no playable tracks");
            }
            ResolveError::InvalidInput(_) => {}
        }
        ApiError::from(e)
    })?;

    Ok(Json(PlayResponse { tracks }))
}
