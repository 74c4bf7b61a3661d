//! Handlers for `/api/v2/authorizations/groups/{uuid}`.
//!
//! Every endpoint is admin only. Mutations are refused on a managed instance
//! before the group is looked up.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use keystone_core::error::CoreError;
use keystone_core::group::GroupUpdate;
use keystone_db::models::group::{Group, GroupPatch};
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::MergePatch;
use crate::middleware::managed::RequireUnmanaged;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// REST representation of a group.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.uuid,
            name: group.name,
            description: group.description,
        }
    }
}

async fn find_group(state: &AppState, uuid: &str) -> AppResult<Group> {
    state
        .groups
        .find_by_uuid(uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Group", uuid).into())
}

/// GET /api/v2/authorizations/groups/{uuid}
pub async fn fetch_group(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let group = find_group(&state, &uuid).await?;

    Ok(Json(GroupResponse::from(group)))
}

/// PATCH /api/v2/authorizations/groups/{uuid}
///
/// Merge-patch of `name` and `description`. An explicit `null` description
/// clears it; a `null` name is rejected.
pub async fn update_group(
    RequireAdmin(admin): RequireAdmin,
    _unmanaged: RequireUnmanaged,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    MergePatch(patch): MergePatch<GroupPatch>,
) -> AppResult<impl IntoResponse> {
    let group = find_group(&state, &uuid).await?;

    let update = GroupUpdate::resolve(
        &group.name,
        group.description.as_deref(),
        patch.name,
        patch.description,
    )?;

    if update.name == group.name && update.description == group.description {
        return Ok(Json(GroupResponse::from(group)));
    }

    let updated = state.groups.update(&group, &update).await?;

    tracing::info!(group_uuid = %uuid, login = %admin.login, "Group updated");

    Ok(Json(GroupResponse::from(updated)))
}

/// DELETE /api/v2/authorizations/groups/{uuid}
pub async fn delete_group(
    RequireAdmin(admin): RequireAdmin,
    _unmanaged: RequireUnmanaged,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let group = find_group(&state, &uuid).await?;

    state.groups.delete(&group).await?;

    tracing::info!(group_uuid = %uuid, login = %admin.login, "Group deleted");

    Ok(StatusCode::NO_CONTENT)
}
