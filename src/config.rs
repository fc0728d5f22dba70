// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Root directory for persistent storage | `./data` |
//! | `CORS_ORIGIN` | Allowed browser origin (credentials enabled) | permissive CORS |
//! | `JWT_SECRET` | HMAC secret for session tokens | dev secret (warns) |
//! | `BODY_LIMIT_BYTES` | Max request body size (wall payloads carry inline images) | `20971520` (20 MiB) |
//! | `MAIL_API_URL` | Transactional mail API endpoint | log-only mailer |
//! | `MAIL_API_KEY` | Bearer key for the mail API | log-only mailer |
//! | `MAIL_FROM` | Sender address on outgoing mail | `DreamWall <no-reply@dreamwall.app>` |
//! | `CONTACT_EMAIL` | Recipient for contact-form relays | falls back to `MAIL_FROM` |
//! | `SEED_ADMIN_EMAIL` | Seed an admin account at startup | disabled |
//! | `SEED_ADMIN_PASSWORD` | Password for the seeded admin | disabled |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, path::PathBuf};

use tracing::warn;

/// Environment variable name for the storage root.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default request body limit: wall layouts embed data-URL images.
const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Fallback signing secret. Only acceptable for local development.
const DEV_JWT_SECRET: &str = "dreamwall-dev-secret";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub jwt_secret: String,
    pub body_limit_bytes: usize,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Self {
            host: env_or_default("HOST", "0.0.0.0"),
            port: parse_or_default("PORT", 5000),
            data_dir: PathBuf::from(env_or_default(DATA_DIR_ENV, "./data")),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
            jwt_secret,
            body_limit_bytes: parse_or_default("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT),
        }
    }
}

impl Default for Config {
    /// Development defaults, without touching the environment.
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            data_dir: PathBuf::from("./data"),
            cors_origin: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

pub(crate) fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_or_default<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_dev_friendly() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.cors_origin.is_none());
        assert_eq!(config.body_limit_bytes, DEFAULT_BODY_LIMIT);
    }
}
