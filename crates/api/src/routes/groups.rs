use axum::routing::get;
use axum::Router;

use crate::handlers::groups;
use crate::state::AppState;

/// Group routes mounted at `/authorizations/groups`.
///
/// ```text
/// GET    /{uuid}    -> fetch_group
/// PATCH  /{uuid}    -> update_group
/// DELETE /{uuid}    -> delete_group
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{uuid}",
        get(groups::fetch_group)
            .patch(groups::update_group)
            .delete(groups::delete_group),
    )
}
