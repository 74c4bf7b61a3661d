//! Body extractors beyond what axum ships.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// A JSON merge-patch (RFC 7396) body.
///
/// Requires `Content-Type: application/merge-patch+json`.
#[derive(Debug, Clone)]
pub struct MergePatch<T>(pub T);

impl<T, S> FromRequest<S> for MergePatch<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_merge_patch(req.headers()) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Expected request with `Content-Type: {MERGE_PATCH_CONTENT_TYPE}`"
            )));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Invalid merge-patch document: {e}")))?;

        Ok(MergePatch(value))
    }
}

fn is_merge_patch(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(MERGE_PATCH_CONTENT_TYPE))
}
