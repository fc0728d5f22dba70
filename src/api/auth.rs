// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Authentication endpoints: OTP issue/verify, signup, login, and the
//! password flows.
//!
//! Wording of user-facing error messages is part of the API contract the
//! frontend surfaces directly, so the messages here are deliberately
//! conversational.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{hash_password, verify_password, Auth, Role},
    error::ApiError,
    mailer::templates,
    models::{MessageResponse, PublicUser},
    state::AppState,
    storage::{StoredUser, UserRepository},
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub otp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPasswordResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Issue an OTP and email it.
#[utoipa::path(
    post,
    path = "/api/auth/send-otp",
    request_body = SendOtpRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse), (status = 400))
)]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::bad_request("Please enter your email address."));
    }

    let code = state.otp.write().await.issue(&request.email)?;

    // The user cannot proceed without the code, so this send is NOT
    // best-effort.
    let (subject, body) = templates::otp_code(&code);
    state
        .mailer
        .send(&request.email, &subject, &body)
        .await
        .map_err(|e| {
            tracing::error!("OTP email failed: {e}");
            ApiError::internal(
                "Sorry, we could not send the OTP at this time. Please try again later.",
            )
        })?;

    Ok(Json(MessageResponse::new("OTP sent to email")))
}

/// Check an OTP without consuming it (marks the entry verified).
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse), (status = 400))
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() || request.otp.is_empty() {
        return Err(ApiError::bad_request(
            "Please enter both your email address and the OTP.",
        ));
    }

    state.otp.write().await.verify(&request.email, &request.otp)?;
    Ok(Json(MessageResponse::new("OTP verified")))
}

/// Create an account. Requires a matching, unexpired OTP for the email.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses((status = 201, body = SessionResponse), (status = 400))
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("All fields are required."));
    }

    state
        .otp
        .write()
        .await
        .consume(&request.email, &request.otp)?;

    let repo = UserRepository::new(&state.storage);
    if repo.get_by_email(&request.email)?.is_some() {
        return Err(ApiError::bad_request(
            "An account with this email already exists. Please log in or use a different email.",
        ));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?;

    let user = StoredUser::new(request.username, request.email, password_hash, Role::User);
    repo.create(&user)?;

    if user.notifications_enabled {
        let (subject, body) = templates::welcome(&user.username);
        state.mailer.send_best_effort(&user.email, &subject, &body).await;
    }

    let token = state
        .auth
        .issue(&user.id, &user.email)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User created successfully".to_string(),
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Log in with email + password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses((status = 200, body = SessionResponse), (status = 400))
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    // Same message for unknown email and wrong password.
    let invalid = || {
        ApiError::bad_request(
            "The email or password you entered is incorrect. Please try again.",
        )
    };

    let repo = UserRepository::new(&state.storage);
    let user = repo.get_by_email(&request.email)?.ok_or_else(invalid)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(invalid());
    }

    let token = state
        .auth
        .issue(&user.id, &user.email)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if user.notifications_enabled {
        let (subject, body) = templates::login_notice(&user.username);
        state.mailer.send_best_effort(&user.email, &subject, &body).await;
    }

    Ok(Json(SessionResponse {
        message: "Login successful".to_string(),
        token,
        user: PublicUser::from(&user),
    }))
}

/// Start a password reset. The response never reveals whether the account
/// exists.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const NEUTRAL: &str = "If an account with that email exists, you will receive an OTP shortly.";

    let repo = UserRepository::new(&state.storage);
    if repo.get_by_email(&request.email)?.is_some() {
        let code = state.otp.write().await.issue(&request.email)?;
        let (subject, body) = templates::password_reset_otp(&code);
        state
            .mailer
            .send(&request.email, &subject, &body)
            .await
            .map_err(|e| {
                tracing::error!("password reset OTP email failed: {e}");
                ApiError::internal(
                    "Sorry, we could not process your password reset request at this time. Please try again later.",
                )
            })?;
    }

    Ok(Json(MessageResponse::new(NEUTRAL)))
}

/// Finish a password reset. The OTP must have passed `/verify-otp` first.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse), (status = 400))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.new_password.is_empty() {
        return Err(ApiError::bad_request("Please enter a new password."));
    }

    state
        .otp
        .write()
        .await
        .consume_verified(&request.email, &request.otp)?;

    let repo = UserRepository::new(&state.storage);
    let mut user = repo.get_by_email(&request.email)?.ok_or_else(|| {
        ApiError::bad_request("We could not find an account with this email address.")
    })?;

    user.password_hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?;
    repo.update(&user)?;

    let (subject, body) = templates::password_reset_done(&user.username);
    state.mailer.send_best_effort(&user.email, &subject, &body).await;

    Ok(Json(MessageResponse::new(
        "Your password has been reset successfully!",
    )))
}

/// Change the caller's password.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 400), (status = 401))
)]
pub async fn change_password(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.new_password.is_empty() {
        return Err(ApiError::bad_request("Please enter a new password."));
    }

    let repo = UserRepository::new(&state.storage);
    let mut user = repo
        .get(&caller.user_id)
        .map_err(|_| ApiError::not_found("We could not find your account."))?;

    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::bad_request(
            "The current password you entered is incorrect. Please try again.",
        ));
    }

    user.password_hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?;
    repo.update(&user)?;

    let (subject, body) = templates::password_changed(&user.username);
    state.mailer.send_best_effort(&user.email, &subject, &body).await;

    Ok(Json(MessageResponse::new(
        "Your password has been changed successfully.",
    )))
}

/// Re-check the caller's password (gates destructive UI actions).
#[utoipa::path(
    post,
    path = "/api/auth/verify-password",
    request_body = VerifyPasswordRequest,
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = VerifyPasswordResponse), (status = 401))
)]
pub async fn verify_caller_password(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, ApiError> {
    if request.password.is_empty() {
        return Err(ApiError::bad_request("Please enter your password."));
    }

    let repo = UserRepository::new(&state.storage);
    let user = repo
        .get(&caller.user_id)
        .map_err(|_| ApiError::not_found("We could not find your account."))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized(
            "The password you entered is incorrect. Please try again.",
        ));
    }

    Ok(Json(VerifyPasswordResponse { success: true }))
}

/// Relay a contact-form message to the site operator.
#[utoipa::path(
    post,
    path = "/api/auth/contact",
    request_body = ContactRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse), (status = 400))
)]
pub async fn contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.name.is_empty() || request.email.is_empty() || request.message.is_empty() {
        return Err(ApiError::bad_request("Please fill in all fields."));
    }

    let (subject, body) = templates::contact_relay(&request.name, &request.email, &request.message);
    let to = state.mailer.contact_address().to_string();
    state.mailer.send(&to, &subject, &body).await.map_err(|e| {
        tracing::error!("contact form relay failed: {e}");
        ApiError::internal(
            "Sorry, we could not send your message at this time. Please try again later.",
        )
    })?;

    Ok(Json(MessageResponse::new(
        "Message sent successfully! We will get back to you soon.",
    )))
}
