// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! # API Data Models
//!
//! Shared request and response structures, and the wall-design layout model.
//! All types derive `Serialize`, `Deserialize`, and `ToSchema` for automatic
//! JSON handling and OpenAPI documentation.
//!
//! ## Wall Layout
//!
//! [`WallLayout`] is the canvas document the editor saves: canvas geometry,
//! background, and a z-ordered list of placed images. Field names follow the
//! wire format the editor has always used (`wallBg`, `imgwidth`, ...), so
//! layouts saved by older clients keep loading. Shape names are kept as
//! plain strings for the same reason.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::Role, storage::StoredUser};

// =============================================================================
// Wall Layout
// =============================================================================

fn default_canvas_width() -> f64 {
    800.0
}

fn default_canvas_height() -> f64 {
    500.0
}

fn default_item_size() -> f64 {
    100.0
}

fn default_shape() -> String {
    "rectangle".to_string()
}

/// A decorative image placed on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PlacedImage {
    /// Horizontal position on the canvas.
    pub x: f64,
    /// Vertical position on the canvas.
    pub y: f64,
    /// Rendered width.
    pub w: f64,
    /// Rendered height.
    pub h: f64,
    /// Clip shape (`rectangle`, `circle`, `ellipse`).
    #[serde(default = "default_shape")]
    pub shape: String,
    /// Image source: a data URL or an asset path. `None` when the source
    /// was a session-local object URL that cannot be restored.
    #[serde(default)]
    pub src: Option<String>,
    /// Stacking order; higher draws on top.
    #[serde(default)]
    pub z: i64,
}

/// The saved canvas document for one altar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WallLayout {
    /// Canvas width in pixels.
    #[serde(default = "default_canvas_width")]
    pub width: f64,
    /// Canvas height in pixels.
    #[serde(default = "default_canvas_height")]
    pub height: f64,
    /// Background color (CSS color string).
    #[serde(default)]
    pub color: Option<String>,
    /// Background image source.
    #[serde(default, rename = "wallBg")]
    pub wall_bg: Option<String>,
    /// Placed images, stored in ascending z-order.
    #[serde(default)]
    pub images: Vec<PlacedImage>,
    /// Canvas shape (`rectangle`, `circle`, `ellipse`).
    #[serde(default = "default_shape")]
    pub shape: String,
    /// Default width for newly placed images.
    #[serde(default = "default_item_size", rename = "imgwidth")]
    pub img_width: f64,
    /// Default height for newly placed images.
    #[serde(default = "default_item_size", rename = "imgheight")]
    pub img_height: f64,
    /// Free-text note attached by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    /// Client-side save timestamp (ISO-8601 string, informational only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Default for WallLayout {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            color: None,
            wall_bg: None,
            images: Vec::new(),
            shape: default_shape(),
            img_width: default_item_size(),
            img_height: default_item_size(),
            interest: None,
            timestamp: None,
        }
    }
}

impl WallLayout {
    /// Normalize a layout before persisting it.
    ///
    /// - Images are sorted ascending by z (stable, so ties keep their
    ///   relative order).
    /// - `blob:` sources are session-local object URLs and can never be
    ///   restored, so they are dropped to `None`.
    pub fn normalize(&mut self) {
        self.images.sort_by_key(|img| img.z);
        for img in &mut self.images {
            if img.src.as_deref().is_some_and(|src| src.starts_with("blob:")) {
                img.src = None;
            }
        }
    }
}

// =============================================================================
// User Models
// =============================================================================

/// Public view of an account. This is the only user shape that leaves the
/// API; the stored record (with its password hash) never does.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PublicUser {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Authorization role.
    pub role: Role,
    /// Profile photo (data URL or asset path).
    pub profile_photo: Option<String>,
    /// Current subscription plan name.
    pub subscription_plan: Option<String>,
    /// When the current subscription started.
    pub subscription_start: Option<chrono::DateTime<chrono::Utc>>,
    /// When the current subscription lapses.
    pub subscription_end: Option<chrono::DateTime<chrono::Utc>>,
    /// When the account was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&StoredUser> for PublicUser {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_photo: user.profile_photo.clone(),
            subscription_plan: user.subscription_plan.clone(),
            subscription_start: user.subscription_start,
            subscription_end: user.subscription_end,
            created_at: user.created_at,
        }
    }
}

/// Plain message envelope used by most mutation endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
