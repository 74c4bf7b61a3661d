//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use keystone_core::error::CoreError;
use keystone_core::roles::ROLE_ADMIN;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            tracing::debug!(login = %user.login, role = %user.role, "Admin role required");
            return Err(AppError::Core(CoreError::Forbidden(
                "Insufficient privileges".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
