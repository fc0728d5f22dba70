// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Wall design endpoints: CRUD, tokenized sharing, and history.
//!
//! Reads are public (the gallery and shared links must work logged out).
//! Mutations require a session and ownership, except the edit-token routes:
//! possession of the edit token IS the authorization there.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{Auth, Role},
    error::ApiError,
    models::{MessageResponse, WallLayout},
    state::AppState,
    storage::{StoredWallDesign, UserRepository, WallRepository},
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Public view of a design. Share and edit tokens are never included here;
/// they only leave through the explicit share endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WallDesignResponse {
    pub id: String,
    pub user_id: String,
    pub wall_name: String,
    pub wall_data: WallLayout,
    pub public: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<StoredWallDesign> for WallDesignResponse {
    fn from(design: StoredWallDesign) -> Self {
        Self {
            id: design.id,
            user_id: design.user_id,
            wall_name: design.wall_name,
            wall_data: design.wall_data,
            public: design.public,
            created_at: design.created_at,
            updated_at: design.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveWallRequest {
    pub wall_name: String,
    pub wall_data: WallLayout,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveWallResponse {
    pub message: String,
    pub wall_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWallRequest {
    pub wall_name: String,
    pub wall_data: WallLayout,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareTokenResponse {
    pub share_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditTokenResponse {
    pub edit_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPublicRequest {
    pub public: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WallHistoryResponse {
    pub history: Vec<WallDesignResponse>,
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_layout(wall_name: &str, layout: &WallLayout) -> Result<(), ApiError> {
    if wall_name.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Missing required fields: wallData, wallName",
        ));
    }
    if !(layout.width.is_finite() && layout.width > 0.0)
        || !(layout.height.is_finite() && layout.height > 0.0)
    {
        return Err(ApiError::bad_request(
            "Invalid wall data: canvas dimensions must be positive",
        ));
    }
    for img in &layout.images {
        let coords = [img.x, img.y, img.w, img.h];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(ApiError::bad_request(
                "Invalid wall data: image placement must use finite coordinates",
            ));
        }
    }
    Ok(())
}

/// Owner-or-admin gate for mutations on a design.
fn authorize_mutation(
    state: &AppState,
    caller_id: &str,
    design: &StoredWallDesign,
) -> Result<(), ApiError> {
    if design.user_id == caller_id {
        return Ok(());
    }

    let caller = UserRepository::new(&state.storage)
        .get(caller_id)
        .map_err(|_| ApiError::not_found("We could not find your account."))?;
    if caller.role == Role::Admin {
        return Ok(());
    }

    Err(ApiError::forbidden(
        "You are not authorized to modify this altar.",
    ))
}

// ============================================================================
// Handlers
// ============================================================================

/// The public gallery feed: every design, newest first.
#[utoipa::path(
    get,
    path = "/api/wall",
    tag = "Walls",
    responses((status = 200, body = [WallDesignResponse]))
)]
pub async fn list_designs(
    State(state): State<AppState>,
) -> Result<Json<Vec<WallDesignResponse>>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let designs = repo.list_all()?;
    Ok(Json(designs.into_iter().map(Into::into).collect()))
}

/// A user's designs, newest first.
#[utoipa::path(
    get,
    path = "/api/wall/user/{user_id}",
    params(("user_id" = String, Path, description = "Owner of the designs")),
    tag = "Walls",
    responses((status = 200, body = [WallDesignResponse]))
)]
pub async fn list_user_designs(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WallDesignResponse>>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let designs = repo.list_by_user(&user_id)?;
    Ok(Json(designs.into_iter().map(Into::into).collect()))
}

/// Save a new design under the caller's account.
#[utoipa::path(
    post,
    path = "/api/wall/save",
    request_body = SaveWallRequest,
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 201, body = SaveWallResponse), (status = 400))
)]
pub async fn save_design(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<SaveWallRequest>,
) -> Result<(StatusCode, Json<SaveWallResponse>), ApiError> {
    validate_layout(&request.wall_name, &request.wall_data)?;

    let mut layout = request.wall_data;
    layout.normalize();

    let design = StoredWallDesign::new(caller.user_id, request.wall_name, layout);
    WallRepository::new(&state.storage).create(&design)?;

    Ok((
        StatusCode::CREATED,
        Json(SaveWallResponse {
            message: "Wall design saved successfully".to_string(),
            wall_id: design.id,
        }),
    ))
}

/// Fetch one design.
#[utoipa::path(
    get,
    path = "/api/wall/{design_id}",
    params(("design_id" = String, Path, description = "Design to fetch")),
    tag = "Walls",
    responses((status = 200, body = WallDesignResponse), (status = 404))
)]
pub async fn get_design(
    Path(design_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WallDesignResponse>, ApiError> {
    let design = WallRepository::new(&state.storage)
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Wall design not found"))?;
    Ok(Json(design.into()))
}

/// Replace a design's name and layout (owner or admin).
#[utoipa::path(
    put,
    path = "/api/wall/{design_id}",
    params(("design_id" = String, Path, description = "Design to update")),
    request_body = UpdateWallRequest,
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn update_design(
    Auth(caller): Auth,
    Path(design_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateWallRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_layout(&request.wall_name, &request.wall_data)?;

    let repo = WallRepository::new(&state.storage);
    let mut design = repo
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Wall design not found"))?;

    authorize_mutation(&state, &caller.user_id, &design)?;

    let mut layout = request.wall_data;
    layout.normalize();

    design.wall_name = request.wall_name;
    design.wall_data = layout;
    design.updated_at = Utc::now();
    repo.update(&design)?;

    Ok(Json(MessageResponse::new(
        "Wall design updated successfully",
    )))
}

/// Delete a design (owner or admin).
#[utoipa::path(
    delete,
    path = "/api/wall/{design_id}",
    params(("design_id" = String, Path, description = "Design to delete")),
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn delete_design(
    Auth(caller): Auth,
    Path(design_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let design = repo
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Wall design not found"))?;

    authorize_mutation(&state, &caller.user_id, &design)?;
    repo.delete(&design_id)?;

    Ok(Json(MessageResponse::new(
        "Wall design deleted successfully",
    )))
}

/// Return the design's share token, minting it on first use (owner or admin).
#[utoipa::path(
    post,
    path = "/api/wall/{design_id}/share",
    params(("design_id" = String, Path, description = "Design to share")),
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = ShareTokenResponse), (status = 403), (status = 404))
)]
pub async fn share_design(
    Auth(caller): Auth,
    Path(design_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShareTokenResponse>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let design = repo
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Altar not found"))?;

    authorize_mutation(&state, &caller.user_id, &design)?;
    let share_token = repo.ensure_share_token(&design_id)?;

    Ok(Json(ShareTokenResponse { share_token }))
}

/// Return the design's edit token, minting it on first use (owner or admin).
#[utoipa::path(
    post,
    path = "/api/wall/{design_id}/edit-share",
    params(("design_id" = String, Path, description = "Design to share for editing")),
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = EditTokenResponse), (status = 403), (status = 404))
)]
pub async fn edit_share_design(
    Auth(caller): Auth,
    Path(design_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EditTokenResponse>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let design = repo
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Altar not found"))?;

    authorize_mutation(&state, &caller.user_id, &design)?;
    let edit_token = repo.ensure_edit_token(&design_id)?;

    Ok(Json(EditTokenResponse { edit_token }))
}

/// Read-only fetch by share token.
#[utoipa::path(
    get,
    path = "/api/wall/shared/{token}",
    params(("token" = String, Path, description = "Share token")),
    tag = "Walls",
    responses((status = 200, body = WallDesignResponse), (status = 404))
)]
pub async fn get_shared(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WallDesignResponse>, ApiError> {
    let design = WallRepository::new(&state.storage)
        .get_by_share_token(&token)
        .map_err(|_| ApiError::not_found("Altar not found"))?;
    Ok(Json(design.into()))
}

/// Toggle a design's public flag (owner or admin).
#[utoipa::path(
    put,
    path = "/api/wall/{design_id}/public",
    params(("design_id" = String, Path, description = "Design to toggle")),
    request_body = SetPublicRequest,
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn set_public(
    Auth(caller): Auth,
    Path(design_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SetPublicRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = WallRepository::new(&state.storage);
    let mut design = repo
        .get(&design_id)
        .map_err(|_| ApiError::not_found("Altar not found"))?;

    authorize_mutation(&state, &caller.user_id, &design)?;
    design.public = request.public;
    repo.update(&design)?;

    Ok(Json(MessageResponse::new("Public status updated")))
}

/// Fetch by edit token (edit mode).
#[utoipa::path(
    get,
    path = "/api/wall/edit/{edit_token}",
    params(("edit_token" = String, Path, description = "Edit token")),
    tag = "Walls",
    responses((status = 200, body = WallDesignResponse), (status = 404))
)]
pub async fn get_by_edit_token(
    Path(edit_token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WallDesignResponse>, ApiError> {
    let design = WallRepository::new(&state.storage)
        .get_by_edit_token(&edit_token)
        .map_err(|_| ApiError::not_found("Altar not found"))?;
    Ok(Json(design.into()))
}

/// Update by edit token. The token itself is the authorization.
#[utoipa::path(
    put,
    path = "/api/wall/edit/{edit_token}",
    params(("edit_token" = String, Path, description = "Edit token")),
    request_body = UpdateWallRequest,
    tag = "Walls",
    responses((status = 200, body = MessageResponse), (status = 400), (status = 404))
)]
pub async fn update_by_edit_token(
    Path(edit_token): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateWallRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_layout(&request.wall_name, &request.wall_data)?;

    let repo = WallRepository::new(&state.storage);
    let mut design = repo
        .get_by_edit_token(&edit_token)
        .map_err(|_| ApiError::not_found("Wall design not found"))?;

    let mut layout = request.wall_data;
    layout.normalize();

    design.wall_name = request.wall_name;
    design.wall_data = layout;
    design.updated_at = Utc::now();
    repo.update(&design)?;

    Ok(Json(MessageResponse::new(
        "Wall design updated successfully",
    )))
}

/// A user's design history, gated by their profile privacy setting.
#[utoipa::path(
    get,
    path = "/api/wall/history/{user_id}",
    params(("user_id" = String, Path, description = "Owner of the history")),
    tag = "Walls",
    security(("bearer" = [])),
    responses((status = 200, body = WallHistoryResponse), (status = 403), (status = 404))
)]
pub async fn user_history(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WallHistoryResponse>, ApiError> {
    let users = UserRepository::new(&state.storage);
    let target = users
        .get(&user_id)
        .map_err(|_| ApiError::not_found("User not found"))?;

    let is_owner = caller.user_id == user_id;
    let is_admin = users
        .get(&caller.user_id)
        .map(|u| u.role == Role::Admin)
        .unwrap_or(false);

    if !target.profile_public && !is_owner && !is_admin {
        return Err(ApiError::forbidden("This user's history is private."));
    }

    let history = WallRepository::new(&state.storage).list_by_user(&user_id)?;
    Ok(Json(WallHistoryResponse {
        history: history.into_iter().map(Into::into).collect(),
    }))
}
