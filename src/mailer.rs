// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Transactional email client.
//!
//! Messages are posted to an HTTP mail API (`MAIL_API_URL` + `MAIL_API_KEY`).
//! When the API is not configured the mailer runs in log-only mode: the
//! message is traced and the send reports success, which keeps local
//! development working without a mail account.
//!
//! Every product email except the OTP code is best-effort: a failed send is
//! logged and never fails the request that triggered it.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::config::env_or_default;

const DEFAULT_FROM: &str = "DreamWall <no-reply@dreamwall.app>";
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail client could not be built: {0}")]
    Client(String),

    #[error("mail request failed: {0}")]
    Request(String),

    #[error("mail API rejected the message: {0}")]
    Rejected(String),
}

enum Transport {
    /// POST to a transactional mail API.
    Http {
        http: Client,
        api_url: String,
        api_key: String,
    },
    /// Development mode: trace the message instead of sending it.
    Log,
}

pub struct Mailer {
    transport: Transport,
    from: String,
    contact_address: String,
}

impl Mailer {
    /// Build the mailer from the environment. Falls back to log-only mode
    /// when `MAIL_API_URL`/`MAIL_API_KEY` are absent.
    pub fn from_env() -> Result<Self, MailerError> {
        let from = env_or_default("MAIL_FROM", DEFAULT_FROM);
        let contact_address = env_or_default("CONTACT_EMAIL", &from);

        let api_url = std::env::var("MAIL_API_URL").ok().filter(|s| !s.is_empty());
        let api_key = std::env::var("MAIL_API_KEY").ok().filter(|s| !s.is_empty());

        let transport = match (api_url, api_key) {
            (Some(api_url), Some(api_key)) => {
                let http = Client::builder()
                    .timeout(SEND_TIMEOUT)
                    .build()
                    .map_err(|e| MailerError::Client(e.to_string()))?;
                Transport::Http {
                    http,
                    api_url,
                    api_key,
                }
            }
            _ => {
                info!("mail API not configured; emails will be logged only");
                Transport::Log
            }
        };

        Ok(Self {
            transport,
            from,
            contact_address,
        })
    }

    /// Log-only mailer (tests and local development).
    pub fn log_only() -> Self {
        Self {
            transport: Transport::Log,
            from: DEFAULT_FROM.to_string(),
            contact_address: DEFAULT_FROM.to_string(),
        }
    }

    /// Address the contact form relays to.
    pub fn contact_address(&self) -> &str {
        &self.contact_address
    }

    /// Send a message, propagating failures.
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), MailerError> {
        match &self.transport {
            Transport::Http {
                http,
                api_url,
                api_key,
            } => {
                let payload = json!({
                    "from": self.from,
                    "to": to,
                    "subject": subject,
                    "text": text,
                });

                let response = http
                    .post(api_url)
                    .bearer_auth(api_key)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| MailerError::Request(e.to_string()))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(MailerError::Rejected(format!("{status}: {body}")));
                }

                Ok(())
            }
            Transport::Log => {
                info!(to, subject, "mail (log-only): {text}");
                Ok(())
            }
        }
    }

    /// Send a message, swallowing failures with a warning.
    pub async fn send_best_effort(&self, to: &str, subject: &str, text: &str) {
        if let Err(e) = self.send(to, subject, text).await {
            warn!(to, subject, "email send failed: {e}");
        }
    }
}

// =============================================================================
// Message Templates
// =============================================================================

/// Templates return `(subject, body)` pairs.
pub mod templates {
    pub fn otp_code(code: &str) -> (String, String) {
        (
            "Your OTP Code".to_string(),
            format!("Your OTP code is: {code}. It expires in 10 minutes."),
        )
    }

    pub fn password_reset_otp(code: &str) -> (String, String) {
        (
            "Your Password Reset OTP".to_string(),
            format!("Your OTP code for password reset is: {code}. It expires in 10 minutes."),
        )
    }

    pub fn welcome(username: &str) -> (String, String) {
        (
            "Welcome to DreamWall!".to_string(),
            format!(
                "Hi {username},\n\nThank you for signing up for DreamWall! We are excited to have you on board."
            ),
        )
    }

    pub fn admin_created_account(username: &str) -> (String, String) {
        (
            "Welcome to DreamWall!".to_string(),
            format!(
                "Hi {username},\n\nYour account has been created by an administrator. You can now log in to DreamWall."
            ),
        )
    }

    pub fn login_notice(username: &str) -> (String, String) {
        (
            "Login Notification".to_string(),
            format!(
                "Hi {username},\n\nYou have successfully logged in to your DreamWall account. If this wasn't you, please reset your password immediately."
            ),
        )
    }

    pub fn password_reset_done(username: &str) -> (String, String) {
        (
            "Password Reset Successful".to_string(),
            format!(
                "Hi {username},\n\nYour password has been reset successfully. If you did not request this, please contact support immediately."
            ),
        )
    }

    pub fn password_changed(username: &str) -> (String, String) {
        (
            "Password Changed Successfully".to_string(),
            format!(
                "Hi {username},\n\nYour password has been changed successfully. If you did not request this, please contact support immediately."
            ),
        )
    }

    pub fn profile_updated(username: &str, by_admin: bool) -> (String, String) {
        let body = if by_admin {
            format!(
                "Hi {username},\n\nYour profile was updated by an administrator. If you did not request this, please contact support."
            )
        } else {
            format!(
                "Hi {username},\n\nYour profile has been updated successfully. If you did not request this, please contact support."
            )
        };
        ("Profile Updated".to_string(), body)
    }

    pub fn account_deleted(username: &str, by_admin: bool) -> (String, String) {
        let body = if by_admin {
            format!(
                "Hi {username},\n\nYour DreamWall account has been deleted by an administrator. Please contact support if you have questions."
            )
        } else {
            format!(
                "Hi {username},\n\nYour DreamWall account has been deleted. If this wasn't you, please contact support."
            )
        };
        ("Account Deleted".to_string(), body)
    }

    pub fn subscription_changed(username: &str, plan: &str) -> (String, String) {
        (
            "Subscription Plan Changed".to_string(),
            format!(
                "Hi {username},\n\nYour subscription plan has been changed to '{plan}'. If you did not request this, please contact support immediately."
            ),
        )
    }

    pub fn contact_relay(name: &str, email: &str, message: &str) -> (String, String) {
        (
            format!("New Contact Form Message from {name}"),
            format!(
                "Name: {name}\nEmail: {email}\nMessage: {message}\n\nThis message was sent from the DreamWall contact form."
            ),
        )
    }
}
