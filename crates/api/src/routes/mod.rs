pub mod groups;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v2` route tree.
///
/// ```text
/// /authorizations/groups/{uuid}     get, patch, delete (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/authorizations/groups", groups::router())
}
