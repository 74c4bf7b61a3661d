//! Managed-instance guard.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Rejects with 400 when identities are managed externally.
///
/// Place it after [`RequireAdmin`](super::rbac::RequireAdmin) and before any
/// body extractor so the admin check wins and the body is never parsed.
pub struct RequireUnmanaged;

impl FromRequestParts<AppState> for RequireUnmanaged {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.managed_instance.check_not_managed()?;
        Ok(RequireUnmanaged)
    }
}
