// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Subscription endpoints.
//!
//! Billing is admin-curated: there is no payment processor. Subscribing
//! updates the account's plan window and appends a record to the ledger.

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{AdminOnly, Auth, Role},
    error::ApiError,
    mailer::templates,
    models::MessageResponse,
    state::AppState,
    storage::{BillingRecord, UserRepository},
};

// ============================================================================
// Plan Catalog
// ============================================================================

/// The subscription plans an admin can put an account on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    /// 10-day trial
    Free,
    /// 1 month
    Basic,
    /// 3 months
    Silver,
    /// 6 months
    Gold,
    /// 12 months
    Platinum,
}

impl SubscriptionPlan {
    /// Catalog price, used when no custom amount is supplied.
    pub fn price(&self) -> f64 {
        match self {
            SubscriptionPlan::Free => 0.0,
            SubscriptionPlan::Basic => 99.0,
            SubscriptionPlan::Silver => 249.0,
            SubscriptionPlan::Gold => 449.0,
            SubscriptionPlan::Platinum => 799.0,
        }
    }

    /// When a subscription starting at `start` lapses.
    pub fn end_date(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            SubscriptionPlan::Free => start + Duration::days(10),
            SubscriptionPlan::Basic => add_months(start, 1),
            SubscriptionPlan::Silver => add_months(start, 3),
            SubscriptionPlan::Gold => add_months(start, 6),
            SubscriptionPlan::Platinum => add_months(start, 12),
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionPlan::Free => write!(f, "free"),
            SubscriptionPlan::Basic => write!(f, "basic"),
            SubscriptionPlan::Silver => write!(f, "silver"),
            SubscriptionPlan::Gold => write!(f, "gold"),
            SubscriptionPlan::Platinum => write!(f, "platinum"),
        }
    }
}

fn add_months(start: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    // Month arithmetic only fails near the representable range ends.
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(start)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Plan to subscribe to.
    pub plan: SubscriptionPlan,
    /// Custom amount overriding the catalog price (admin adjustments).
    #[serde(default)]
    pub amount: Option<f64>,
    /// Admins may subscribe another account.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub subscription_plan: Option<String>,
    pub subscription_start: Option<DateTime<Utc>>,
    pub subscription_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillingHistoryResponse {
    pub history: Vec<BillingRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Put an account on a plan. Admins may target another user via `userId`.
#[utoipa::path(
    post,
    path = "/api/auth/subscribe",
    request_body = SubscribeRequest,
    tag = "Subscriptions",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 403), (status = 404))
)]
pub async fn subscribe(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);

    let target_id = match request.user_id {
        Some(ref target) if *target != caller.user_id => {
            let current = repo
                .get(&caller.user_id)
                .map_err(|_| ApiError::not_found("We could not find your account."))?;
            if current.role != Role::Admin {
                return Err(ApiError::forbidden("Forbidden"));
            }
            target.clone()
        }
        _ => caller.user_id.clone(),
    };

    let mut user = repo
        .get(&target_id)
        .map_err(|_| ApiError::not_found("User not found."))?;

    let plan = request.plan;
    let amount = request.amount.unwrap_or_else(|| plan.price());
    let start = Utc::now();
    let end = plan.end_date(start);

    user.subscription_plan = Some(plan.to_string());
    user.subscription_start = Some(start);
    user.subscription_end = Some(end);
    repo.update(&user)?;

    state.billing.append(&BillingRecord::new(
        user.id.clone(),
        plan.to_string(),
        amount,
        start,
        Some(end),
    ))?;

    let (subject, body) = templates::subscription_changed(&user.username, &plan.to_string());
    state.mailer.send_best_effort(&user.email, &subject, &body).await;

    Ok(Json(MessageResponse::new(format!(
        "Subscribed to {plan} plan."
    ))))
}

/// Drop the caller's plan to `none`. Billing history is untouched.
#[utoipa::path(
    post,
    path = "/api/auth/unsubscribe",
    tag = "Subscriptions",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 404))
)]
pub async fn unsubscribe(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let mut user = repo
        .get(&caller.user_id)
        .map_err(|_| ApiError::not_found("We could not find your account."))?;

    user.subscription_plan = Some("none".to_string());
    repo.update(&user)?;

    Ok(Json(MessageResponse::new("Unsubscribed successfully.")))
}

/// The caller's current plan and window.
#[utoipa::path(
    get,
    path = "/api/auth/subscription",
    tag = "Subscriptions",
    security(("bearer" = [])),
    responses((status = 200, body = SubscriptionResponse), (status = 404))
)]
pub async fn get_subscription(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let repo = UserRepository::new(&state.storage);
    let user = repo
        .get(&caller.user_id)
        .map_err(|_| ApiError::not_found("User not found."))?;

    Ok(Json(SubscriptionResponse {
        subscription_plan: user.subscription_plan,
        subscription_start: user.subscription_start,
        subscription_end: user.subscription_end,
    }))
}

/// The caller's billing records, newest first.
#[utoipa::path(
    get,
    path = "/api/auth/billing-history",
    tag = "Subscriptions",
    security(("bearer" = [])),
    responses((status = 200, body = BillingHistoryResponse))
)]
pub async fn billing_history(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<BillingHistoryResponse>, ApiError> {
    let history = state.billing.list_by_user(&caller.user_id)?;
    Ok(Json(BillingHistoryResponse { history }))
}

/// Every billing record, newest first (admin only).
#[utoipa::path(
    get,
    path = "/api/auth/all-billing-history",
    tag = "Subscriptions",
    security(("bearer" = [])),
    responses((status = 200, body = BillingHistoryResponse), (status = 403))
)]
pub async fn all_billing_history(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<BillingHistoryResponse>, ApiError> {
    let history = state.billing.list_all()?;
    Ok(Json(BillingHistoryResponse { history }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support;
    use crate::storage::StoredUser;
    use axum::http::StatusCode;

    fn auth_for(user: &StoredUser) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user.id.clone(),
            email: user.email.clone(),
            expires_at: 0,
        })
    }

    #[test]
    fn plan_catalog_prices() {
        assert_eq!(SubscriptionPlan::Free.price(), 0.0);
        assert_eq!(SubscriptionPlan::Basic.price(), 99.0);
        assert_eq!(SubscriptionPlan::Silver.price(), 249.0);
        assert_eq!(SubscriptionPlan::Gold.price(), 449.0);
        assert_eq!(SubscriptionPlan::Platinum.price(), 799.0);
    }

    #[test]
    fn plan_durations() {
        let start = Utc::now();
        assert_eq!(
            SubscriptionPlan::Free.end_date(start),
            start + Duration::days(10)
        );
        assert!(SubscriptionPlan::Basic.end_date(start) > start + Duration::days(27));
        assert!(SubscriptionPlan::Platinum.end_date(start) > start + Duration::days(360));
    }

    #[tokio::test]
    async fn subscribe_updates_user_and_appends_record() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "sub@example.com", Role::User);

        let Json(response) = subscribe(
            auth_for(&user),
            State(state.clone()),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Silver,
                amount: None,
                user_id: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Subscribed to silver plan.");

        let stored = UserRepository::new(&state.storage).get(&user.id).unwrap();
        assert_eq!(stored.subscription_plan.as_deref(), Some("silver"));
        assert!(stored.subscription_end > stored.subscription_start);

        let history = state.billing.list_by_user(&user.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].plan, "silver");
        assert_eq!(history[0].amount, 249.0);
    }

    #[tokio::test]
    async fn subscribe_accepts_custom_amounts() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "custom@example.com", Role::User);

        subscribe(
            auth_for(&user),
            State(state.clone()),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Gold,
                amount: Some(10.0),
                user_id: None,
            }),
        )
        .await
        .unwrap();

        let history = state.billing.list_by_user(&user.id).unwrap();
        assert_eq!(history[0].amount, 10.0);
    }

    #[tokio::test]
    async fn non_admin_cannot_subscribe_someone_else() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "user@example.com", Role::User);
        let victim = test_support::seed_user(&state, "victim@example.com", Role::User);

        let err = subscribe(
            auth_for(&user),
            State(state),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Basic,
                amount: None,
                user_id: Some(victim.id),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_can_subscribe_another_user() {
        let (state, _guard) = test_support::state();
        let admin = test_support::seed_user(&state, "admin@example.com", Role::Admin);
        let target = test_support::seed_user(&state, "target@example.com", Role::User);

        subscribe(
            auth_for(&admin),
            State(state.clone()),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Basic,
                amount: None,
                user_id: Some(target.id.clone()),
            }),
        )
        .await
        .unwrap();

        let stored = UserRepository::new(&state.storage).get(&target.id).unwrap();
        assert_eq!(stored.subscription_plan.as_deref(), Some("basic"));
        // The record lands on the target, not the admin
        assert_eq!(state.billing.list_by_user(&target.id).unwrap().len(), 1);
        assert!(state.billing.list_by_user(&admin.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_keeps_history() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "quit@example.com", Role::User);

        subscribe(
            auth_for(&user),
            State(state.clone()),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Basic,
                amount: None,
                user_id: None,
            }),
        )
        .await
        .unwrap();

        unsubscribe(auth_for(&user), State(state.clone())).await.unwrap();

        let Json(current) = get_subscription(auth_for(&user), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(current.subscription_plan.as_deref(), Some("none"));

        // History remains
        assert_eq!(state.billing.list_by_user(&user.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn billing_history_is_per_user_and_newest_first() {
        let (state, _guard) = test_support::state();
        let user = test_support::seed_user(&state, "history@example.com", Role::User);
        let other = test_support::seed_user(&state, "other@example.com", Role::User);

        for plan in [SubscriptionPlan::Free, SubscriptionPlan::Basic] {
            subscribe(
                auth_for(&user),
                State(state.clone()),
                Json(SubscribeRequest {
                    plan,
                    amount: None,
                    user_id: None,
                }),
            )
            .await
            .unwrap();
        }
        subscribe(
            auth_for(&other),
            State(state.clone()),
            Json(SubscribeRequest {
                plan: SubscriptionPlan::Gold,
                amount: None,
                user_id: None,
            }),
        )
        .await
        .unwrap();

        let Json(mine) = billing_history(auth_for(&user), State(state)).await.unwrap();
        assert_eq!(mine.history.len(), 2);
        assert!(mine.history.iter().all(|r| r.user_id == user.id));
    }
}
