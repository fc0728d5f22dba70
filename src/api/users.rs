// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! User management endpoints: profile edits, preference toggles, and the
//! admin surface (listing, direct creation, role changes, deletion).

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{hash_password, AdminOnly, Auth, Role},
    error::ApiError,
    mailer::templates,
    models::{MessageResponse, PublicUser},
    state::AppState,
    storage::{StoredUser, UserRepository, WallRepository},
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePhotoRequest {
    /// Data URL or asset path. Empty string clears the photo.
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatePhotoResponse {
    pub message: String,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleRequest {
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MakeAdminRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefsResponse {
    pub notifications_enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationPrefsRequest {
    pub notifications_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationPrefsResponse {
    pub message: String,
    pub notifications_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePrivacyResponse {
    pub profile_public: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePrivacyRequest {
    pub profile_public: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePrivacyResponse {
    pub message: String,
    pub profile_public: bool,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_caller(repo: &UserRepository, user_id: &str) -> Result<StoredUser, ApiError> {
    repo.get(user_id)
        .map_err(|_| ApiError::not_found("We could not find your account."))
}

// ============================================================================
// Handlers
// ============================================================================

/// List all users (admin view), newest first.
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = [PublicUser]), (status = 403))
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let users = repo.list_all()?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

/// Create a user directly, skipping the OTP flow (admin only).
#[utoipa::path(
    post,
    path = "/api/auth/users",
    request_body = CreateUserRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 400), (status = 403))
)]
pub async fn create_user(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.username.is_empty()
        || request.email.is_empty()
        || request.password.is_empty()
        || request.role.is_empty()
    {
        return Err(ApiError::bad_request("All fields are required."));
    }

    let role = Role::from_str(&request.role)
        .ok_or_else(|| ApiError::bad_request("Role must be 'admin' or 'user'."))?;

    let repo = UserRepository::new(&state.storage);
    if repo.get_by_email(&request.email)?.is_some() {
        return Err(ApiError::bad_request(
            "A user with this email already exists.",
        ));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?;
    let user = StoredUser::new(request.username, request.email, password_hash, role);
    repo.create(&user)?;

    let (subject, body) = templates::admin_created_account(&user.username);
    state.mailer.send_best_effort(&user.email, &subject, &body).await;

    Ok(Json(MessageResponse::new("User created successfully.")))
}

/// Update a user's name and email (self or admin).
#[utoipa::path(
    put,
    path = "/api/auth/users/{user_id}",
    params(("user_id" = String, Path, description = "User to update")),
    request_body = UpdateUserRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = UpdateUserResponse), (status = 403), (status = 404))
)]
pub async fn update_user(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UpdateUserResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let current = load_caller(&repo, &caller.user_id)?;

    let by_admin = current.role == Role::Admin && caller.user_id != user_id;
    if current.role != Role::Admin && caller.user_id != user_id {
        return Err(ApiError::forbidden(
            "You are not authorized to update this profile.",
        ));
    }

    let mut target = repo
        .get(&user_id)
        .map_err(|_| ApiError::not_found("User not found."))?;

    if request.email != target.email && repo.get_by_email(&request.email)?.is_some() {
        return Err(ApiError::bad_request(
            "A user with this email already exists.",
        ));
    }

    target.username = request.username;
    target.email = request.email;
    repo.update(&target)?;

    if target.notifications_enabled {
        let (subject, body) = templates::profile_updated(&target.username, by_admin);
        state.mailer.send_best_effort(&target.email, &subject, &body).await;
    }

    Ok(Json(UpdateUserResponse {
        message: "Your profile has been updated successfully.".to_string(),
        user: PublicUser::from(&target),
    }))
}

/// Update a user's profile photo (self or admin).
#[utoipa::path(
    put,
    path = "/api/auth/users/{user_id}/photo",
    params(("user_id" = String, Path, description = "User to update")),
    request_body = UpdatePhotoRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = UpdatePhotoResponse), (status = 400), (status = 403))
)]
pub async fn update_photo(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdatePhotoRequest>,
) -> Result<Json<UpdatePhotoResponse>, ApiError> {
    let Some(photo) = request.profile_photo else {
        return Err(ApiError::bad_request("Please provide a profile photo."));
    };

    let repo = UserRepository::new(&state.storage);
    let current = load_caller(&repo, &caller.user_id)?;
    if current.role != Role::Admin && caller.user_id != user_id {
        return Err(ApiError::forbidden(
            "You are not authorized to update this profile.",
        ));
    }

    let mut target = repo
        .get(&user_id)
        .map_err(|_| ApiError::not_found("User not found."))?;
    target.profile_photo = if photo.is_empty() { None } else { Some(photo) };
    repo.update(&target)?;

    Ok(Json(UpdatePhotoResponse {
        message: "Your profile photo has been updated successfully.".to_string(),
        profile_photo: target.profile_photo,
    }))
}

/// Delete an account (self or admin), cascading designs and billing records.
#[utoipa::path(
    delete,
    path = "/api/auth/users/{user_id}",
    params(("user_id" = String, Path, description = "User to delete")),
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn delete_user(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let current = load_caller(&repo, &caller.user_id)?;

    let by_admin = current.role == Role::Admin && caller.user_id != user_id;
    if current.role != Role::Admin && caller.user_id != user_id {
        return Err(ApiError::forbidden(
            "You are not authorized to perform this action.",
        ));
    }

    let target = repo
        .get(&user_id)
        .map_err(|_| ApiError::not_found("User not found."))?;

    // Cascade before removing the account itself.
    WallRepository::new(&state.storage).delete_by_user(&user_id)?;
    state.billing.delete_by_user(&user_id)?;
    repo.delete(&user_id)?;

    let (subject, body) = templates::account_deleted(&target.username, by_admin);
    state.mailer.send_best_effort(&target.email, &subject, &body).await;

    let message = if by_admin {
        format!("User {} deleted successfully.", target.username)
    } else {
        "Your account has been deleted successfully.".to_string()
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Set a user's role (admin only).
#[utoipa::path(
    post,
    path = "/api/auth/set-role",
    request_body = SetRoleRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 400), (status = 403))
)]
pub async fn set_role(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.user_id.is_empty() || request.role.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide both the user ID and the role.",
        ));
    }

    let role = Role::from_str(&request.role)
        .ok_or_else(|| ApiError::bad_request("Role must be 'admin' or 'user'."))?;

    let repo = UserRepository::new(&state.storage);
    let mut target = repo
        .get(&request.user_id)
        .map_err(|_| ApiError::not_found("User not found."))?;
    target.role = role;
    repo.update(&target)?;

    Ok(Json(MessageResponse::new(format!(
        "The user's role has been updated to {role}."
    ))))
}

/// Promote a user, looked up by email, to admin (admin only).
#[utoipa::path(
    post,
    path = "/api/auth/make-admin",
    request_body = MakeAdminRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn make_admin(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<MakeAdminRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::bad_request("Please enter the user's email address."));
    }

    let repo = UserRepository::new(&state.storage);
    let mut target = repo.get_by_email(&request.email)?.ok_or_else(|| {
        ApiError::not_found("We could not find a user with this email address.")
    })?;
    target.role = Role::Admin;
    repo.update(&target)?;

    Ok(Json(MessageResponse::new(format!(
        "User with email {} has been promoted to admin.",
        request.email
    ))))
}

/// Get the caller's notification preference.
#[utoipa::path(
    get,
    path = "/api/auth/notification-preferences",
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = NotificationPrefsResponse), (status = 404))
)]
pub async fn get_notification_preferences(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<NotificationPrefsResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let user = load_caller(&repo, &caller.user_id)?;
    Ok(Json(NotificationPrefsResponse {
        notifications_enabled: user.notifications_enabled,
    }))
}

/// Update the caller's notification preference.
#[utoipa::path(
    put,
    path = "/api/auth/notification-preferences",
    request_body = UpdateNotificationPrefsRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = UpdateNotificationPrefsResponse), (status = 404))
)]
pub async fn update_notification_preferences(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateNotificationPrefsRequest>,
) -> Result<Json<UpdateNotificationPrefsResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let mut user = load_caller(&repo, &caller.user_id)?;
    user.notifications_enabled = request.notifications_enabled;
    repo.update(&user)?;

    let message = if request.notifications_enabled {
        "Notifications enabled successfully"
    } else {
        "Notifications disabled successfully"
    };
    Ok(Json(UpdateNotificationPrefsResponse {
        message: message.to_string(),
        notifications_enabled: request.notifications_enabled,
    }))
}

/// Get the caller's profile privacy setting.
#[utoipa::path(
    get,
    path = "/api/auth/profile-privacy",
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = ProfilePrivacyResponse), (status = 404))
)]
pub async fn get_profile_privacy(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfilePrivacyResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let user = load_caller(&repo, &caller.user_id)?;
    Ok(Json(ProfilePrivacyResponse {
        profile_public: user.profile_public,
    }))
}

/// Update the caller's profile privacy setting.
#[utoipa::path(
    put,
    path = "/api/auth/profile-privacy",
    request_body = UpdateProfilePrivacyRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses((status = 200, body = UpdateProfilePrivacyResponse), (status = 404))
)]
pub async fn update_profile_privacy(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfilePrivacyRequest>,
) -> Result<Json<UpdateProfilePrivacyResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let mut user = load_caller(&repo, &caller.user_id)?;
    user.profile_public = request.profile_public;
    repo.update(&user)?;

    let message = if request.profile_public {
        "Profile set to public"
    } else {
        "Profile set to private"
    };
    Ok(Json(UpdateProfilePrivacyResponse {
        message: message.to_string(),
        profile_public: request.profile_public,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support;
    use axum::http::StatusCode;

    fn auth_for(user: &StoredUser) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user.id.clone(),
            email: user.email.clone(),
            expires_at: 0,
        })
    }

    fn admin_for(user: &StoredUser) -> AdminOnly {
        AdminOnly(AuthenticatedUser {
            user_id: user.id.clone(),
            email: user.email.clone(),
            expires_at: 0,
        })
    }

    #[tokio::test]
    async fn list_users_is_newest_first() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        test_support::seed_user(&state, "second@example.com", Role::User);

        let Json(users) = list_users(admin_for(&admin), State(state)).await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn create_user_validates_role() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);

        let err = create_user(
            admin_for(&admin),
            State(state),
            Json(CreateUserRequest {
                username: "x".to_string(),
                email: "x@example.com".to_string(),
                password: "pw".to_string(),
                role: "superuser".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_user_rejects_duplicates() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        test_support::seed_user(&state, "taken@example.com", Role::User);

        let err = create_user(
            admin_for(&admin),
            State(state),
            Json(CreateUserRequest {
                username: "x".to_string(),
                email: "taken@example.com".to_string(),
                password: "pw".to_string(),
                role: "user".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(err.message.contains("already exists"));
    }

    #[tokio::test]
    async fn update_user_forbids_editing_others() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "me@example.com", Role::User);
        let other = test_support::seed_user(&state, "other@example.com", Role::User);

        let err = update_user(
            auth_for(&user),
            Path(other.id.clone()),
            State(state),
            Json(UpdateUserRequest {
                username: "hijacked".to_string(),
                email: "hijacked@example.com".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn update_user_allows_self_and_admin() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        let user = test_support::seed_user(&state, "me@example.com", Role::User);

        // Self edit
        let Json(response) = update_user(
            auth_for(&user),
            Path(user.id.clone()),
            State(state.clone()),
            Json(UpdateUserRequest {
                username: "renamed".to_string(),
                email: "me@example.com".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.user.username, "renamed");

        // Admin edit of someone else
        let Json(response) = update_user(
            auth_for(&admin),
            Path(user.id.clone()),
            State(state),
            Json(UpdateUserRequest {
                username: "admin-renamed".to_string(),
                email: "me@example.com".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.user.username, "admin-renamed");
    }

    #[tokio::test]
    async fn delete_user_cascades_designs_and_billing() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "goner@example.com", Role::User);

        let walls = WallRepository::new(&state.storage);
        walls
            .create(&crate::storage::StoredWallDesign::new(
                user.id.clone(),
                "altar".to_string(),
                crate::models::WallLayout::default(),
            ))
            .unwrap();
        state
            .billing
            .append(&crate::storage::BillingRecord::new(
                user.id.clone(),
                "basic".to_string(),
                99.0,
                chrono::Utc::now(),
                None,
            ))
            .unwrap();

        delete_user(auth_for(&user), Path(user.id.clone()), State(state.clone()))
            .await
            .expect("delete succeeds");

        assert!(UserRepository::new(&state.storage).get(&user.id).is_err());
        assert!(WallRepository::new(&state.storage)
            .list_by_user(&user.id)
            .unwrap()
            .is_empty());
        assert!(state.billing.list_by_user(&user.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_role_takes_effect_immediately() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        let user = test_support::seed_user(&state, "promote@example.com", Role::User);

        set_role(
            admin_for(&admin),
            State(state.clone()),
            Json(SetRoleRequest {
                user_id: user.id.clone(),
                role: "admin".to_string(),
            }),
        )
        .await
        .unwrap();

        let stored = UserRepository::new(&state.storage).get(&user.id).unwrap();
        assert_eq!(stored.role, Role::Admin);
    }

    #[tokio::test]
    async fn make_admin_finds_by_email() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        let user = test_support::seed_user(&state, "promote@example.com", Role::User);

        make_admin(
            admin_for(&admin),
            State(state.clone()),
            Json(MakeAdminRequest {
                email: user.email.clone(),
            }),
        )
        .await
        .unwrap();

        let stored = UserRepository::new(&state.storage).get(&user.id).unwrap();
        assert_eq!(stored.role, Role::Admin);

        let err = make_admin(
            admin_for(&admin),
            State(state),
            Json(MakeAdminRequest {
                email: "nobody@example.com".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notification_preferences_round_trip() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "prefs@example.com", Role::User);

        let Json(prefs) = get_notification_preferences(auth_for(&user), State(state.clone()))
            .await
            .unwrap();
        assert!(prefs.notifications_enabled);

        update_notification_preferences(
            auth_for(&user),
            State(state.clone()),
            Json(UpdateNotificationPrefsRequest {
                notifications_enabled: false,
            }),
        )
        .await
        .unwrap();

        let Json(prefs) = get_notification_preferences(auth_for(&user), State(state))
            .await
            .unwrap();
        assert!(!prefs.notifications_enabled);
    }

    #[tokio::test]
    async fn profile_privacy_round_trip() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "privacy@example.com", Role::User);

        let Json(privacy) = get_profile_privacy(auth_for(&user), State(state.clone()))
            .await
            .unwrap();
        assert!(!privacy.profile_public);

        let Json(updated) = update_profile_privacy(
            auth_for(&user),
            State(state.clone()),
            Json(UpdateProfilePrivacyRequest {
                profile_public: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.message, "Profile set to public");

        let Json(privacy) = get_profile_privacy(auth_for(&user), State(state))
            .await
            .unwrap();
        assert!(privacy.profile_public);
    }
}
