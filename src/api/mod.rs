// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{MessageResponse, PlacedImage, PublicUser, WallLayout},
    state::AppState,
    storage::BillingRecord,
};

pub mod auth;
pub mod health;
pub mod subscriptions;
pub mod users;
pub mod walls;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/send-otp", post(auth::send_otp))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/change-password", post(auth::change_password))
        .route("/verify-password", post(auth::verify_caller_password))
        .route("/contact", post(auth::contact))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{user_id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/users/{user_id}/photo", put(users::update_photo))
        .route("/set-role", post(users::set_role))
        .route("/make-admin", post(users::make_admin))
        .route(
            "/notification-preferences",
            get(users::get_notification_preferences).put(users::update_notification_preferences),
        )
        .route(
            "/profile-privacy",
            get(users::get_profile_privacy).put(users::update_profile_privacy),
        )
        .route("/subscribe", post(subscriptions::subscribe))
        .route("/unsubscribe", post(subscriptions::unsubscribe))
        .route("/subscription", get(subscriptions::get_subscription))
        .route("/billing-history", get(subscriptions::billing_history))
        .route(
            "/all-billing-history",
            get(subscriptions::all_billing_history),
        );

    let wall_routes = Router::new()
        .route("/", get(walls::list_designs))
        .route("/user/{user_id}", get(walls::list_user_designs))
        .route("/save", post(walls::save_design))
        .route("/shared/{token}", get(walls::get_shared))
        .route(
            "/edit/{edit_token}",
            get(walls::get_by_edit_token).put(walls::update_by_edit_token),
        )
        .route("/history/{user_id}", get(walls::user_history))
        .route(
            "/{design_id}",
            get(walls::get_design)
                .put(walls::update_design)
                .delete(walls::delete_design),
        )
        .route("/{design_id}/share", post(walls::share_design))
        .route("/{design_id}/edit-share", post(walls::edit_share_design))
        .route("/{design_id}/public", put(walls::set_public));

    let body_limit = state.config.body_limit_bytes;
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/wall", wall_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Browser CORS: a configured origin gets credentials; otherwise stay
/// permissive for development.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::send_otp,
        auth::verify_otp,
        auth::signup,
        auth::login,
        auth::forgot_password,
        auth::reset_password,
        auth::change_password,
        auth::verify_caller_password,
        auth::contact,
        users::list_users,
        users::create_user,
        users::update_user,
        users::update_photo,
        users::delete_user,
        users::set_role,
        users::make_admin,
        users::get_notification_preferences,
        users::update_notification_preferences,
        users::get_profile_privacy,
        users::update_profile_privacy,
        subscriptions::subscribe,
        subscriptions::unsubscribe,
        subscriptions::get_subscription,
        subscriptions::billing_history,
        subscriptions::all_billing_history,
        walls::list_designs,
        walls::list_user_designs,
        walls::save_design,
        walls::get_design,
        walls::update_design,
        walls::delete_design,
        walls::share_design,
        walls::edit_share_design,
        walls::get_shared,
        walls::set_public,
        walls::get_by_edit_token,
        walls::update_by_edit_token,
        walls::user_history
    ),
    components(
        schemas(
            MessageResponse,
            PublicUser,
            WallLayout,
            PlacedImage,
            BillingRecord,
            crate::auth::Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            auth::SendOtpRequest,
            auth::VerifyOtpRequest,
            auth::SignupRequest,
            auth::SessionResponse,
            auth::LoginRequest,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::ChangePasswordRequest,
            auth::VerifyPasswordRequest,
            auth::VerifyPasswordResponse,
            auth::ContactRequest,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::UpdateUserResponse,
            users::UpdatePhotoRequest,
            users::UpdatePhotoResponse,
            users::SetRoleRequest,
            users::MakeAdminRequest,
            users::NotificationPrefsResponse,
            users::UpdateNotificationPrefsRequest,
            users::UpdateNotificationPrefsResponse,
            users::ProfilePrivacyResponse,
            users::UpdateProfilePrivacyRequest,
            users::UpdateProfilePrivacyResponse,
            subscriptions::SubscriptionPlan,
            subscriptions::SubscribeRequest,
            subscriptions::SubscriptionResponse,
            subscriptions::BillingHistoryResponse,
            walls::WallDesignResponse,
            walls::SaveWallRequest,
            walls::SaveWallResponse,
            walls::UpdateWallRequest,
            walls::ShareTokenResponse,
            walls::EditTokenResponse,
            walls::SetPublicRequest,
            walls::WallHistoryResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Auth", description = "OTP, signup, login, and password flows"),
        (name = "Users", description = "Profiles, preferences, and the admin surface"),
        (name = "Subscriptions", description = "Plans and billing history"),
        (name = "Walls", description = "Wall designs and tokenized sharing")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _guard) = test_support::state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_includes_the_wall_routes() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/api/wall/save"));
        assert!(json.contains("/api/auth/send-otp"));
        assert!(json.contains("/api/wall/shared/{token}"));
    }

    #[test]
    fn cors_layer_accepts_a_configured_origin() {
        // Both branches must build without panicking.
        let _ = cors_layer(Some("http://localhost:5173"));
        let _ = cors_layer(None);
    }
}
