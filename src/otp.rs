// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! In-memory OTP store: email → pending code.
//!
//! Codes gate signup and password resets. The state machine is small:
//! `issue` creates (or replaces) a pending code with a 10-minute expiry,
//! `verify` marks it verified without consuming it, and the two consume
//! variants remove the entry so a code can never be replayed. Entries are
//! process-local; a restart simply asks the user to request a new code.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::ApiError;

/// Codes expire 10 minutes after issuance.
const OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
    verified: bool,
}

#[derive(Default)]
pub struct OtpStore {
    entries: HashMap<String, OtpEntry>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh 6-digit code for an email, replacing any pending one.
    /// Returns the code so the caller can email it.
    pub fn issue(&mut self, email: &str) -> Result<String, ApiError> {
        self.issue_at(email, Utc::now())
    }

    /// Verify a code without consuming it. On success the entry is marked
    /// verified (password reset requires this step to have happened).
    pub fn verify(&mut self, email: &str, code: &str) -> Result<(), ApiError> {
        self.verify_at(email, code, Utc::now())
    }

    /// Consume a matching, unexpired code (signup path).
    pub fn consume(&mut self, email: &str, code: &str) -> Result<(), ApiError> {
        self.consume_at(email, code, false, Utc::now())
    }

    /// Consume a matching, unexpired, previously verified code (reset path).
    pub fn consume_verified(&mut self, email: &str, code: &str) -> Result<(), ApiError> {
        self.consume_at(email, code, true, Utc::now())
    }

    fn issue_at(&mut self, email: &str, now: DateTime<Utc>) -> Result<String, ApiError> {
        self.purge_expired(now);

        let code = generate_code()?;
        self.entries.insert(
            email.to_string(),
            OtpEntry {
                code: code.clone(),
                expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
                verified: false,
            },
        );
        Ok(code)
    }

    fn verify_at(&mut self, email: &str, code: &str, now: DateTime<Utc>) -> Result<(), ApiError> {
        enum Outcome {
            NotRequested,
            Expired,
            Mismatch,
            Verified,
        }

        let outcome = match self.entries.get_mut(email) {
            None => Outcome::NotRequested,
            Some(entry) if now > entry.expires_at => Outcome::Expired,
            Some(entry) if entry.code != code => Outcome::Mismatch,
            Some(entry) => {
                entry.verified = true;
                Outcome::Verified
            }
        };

        match outcome {
            Outcome::NotRequested => Err(ApiError::bad_request(
                "No OTP was sent to this email address. Please request an OTP first.",
            )),
            Outcome::Expired => {
                self.entries.remove(email);
                Err(ApiError::bad_request(
                    "The OTP has expired. Please request a new OTP.",
                ))
            }
            Outcome::Mismatch => Err(ApiError::bad_request(
                "The OTP you entered is incorrect. Please check and try again.",
            )),
            Outcome::Verified => Ok(()),
        }
    }

    fn consume_at(
        &mut self,
        email: &str,
        code: &str,
        require_verified: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let matches = self.entries.get(email).is_some_and(|entry| {
            entry.code == code
                && now <= entry.expires_at
                && (!require_verified || entry.verified)
        });

        if !matches {
            // Expired entries are dead either way.
            if self.entries.get(email).is_some_and(|e| now > e.expires_at) {
                self.entries.remove(email);
            }
            return Err(ApiError::bad_request(
                "The OTP you entered is incorrect or has expired. Please request a new OTP and try again.",
            ));
        }

        self.entries.remove(email);
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| now <= entry.expires_at);
    }
}

/// Generate a 6-digit code (100000..=999999).
fn generate_code() -> Result<String, ApiError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 4];
    rng.fill(&mut bytes)
        .map_err(|_| ApiError::internal("Sorry, we could not send the OTP at this time. Please try again later."))?;

    let n = u32::from_be_bytes(bytes);
    Ok(format!("{}", 100_000 + (n % 900_000)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn issued_code_is_six_digits() {
        let mut store = OtpStore::new();
        let code = store.issue("a@b.com").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert!(!code.starts_with('0'));
    }

    #[test]
    fn verify_without_issue_fails() {
        let mut store = OtpStore::new();
        let err = store.verify("a@b.com", "123456").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn verify_wrong_code_fails_but_entry_survives() {
        let mut store = OtpStore::new();
        let code = store.issue("a@b.com").unwrap();

        assert!(store.verify("a@b.com", "000000").is_err());
        // The real code still works afterwards
        store.verify("a@b.com", &code).unwrap();
    }

    #[test]
    fn verify_expired_code_fails() {
        let mut store = OtpStore::new();
        let now = Utc::now();
        let code = store.issue_at("a@b.com", now).unwrap();

        let later = now + Duration::minutes(OTP_TTL_MINUTES + 1);
        let err = store.verify_at("a@b.com", &code, later).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("expired"));
    }

    #[test]
    fn consume_removes_the_entry() {
        let mut store = OtpStore::new();
        let code = store.issue("a@b.com").unwrap();

        store.consume("a@b.com", &code).unwrap();
        // Replays fail
        assert!(store.consume("a@b.com", &code).is_err());
    }

    #[test]
    fn consume_verified_requires_prior_verification() {
        let mut store = OtpStore::new();
        let code = store.issue("a@b.com").unwrap();

        // Not verified yet: the reset path must refuse it
        assert!(store.consume_verified("a@b.com", &code).is_err());

        // The refusal must not have consumed the entry
        store.verify("a@b.com", &code).unwrap();
        store.consume_verified("a@b.com", &code).unwrap();

        // Consumption removes it
        assert!(store.verify("a@b.com", &code).is_err());
    }

    #[test]
    fn reissue_replaces_the_previous_code() {
        let mut store = OtpStore::new();
        let first = store.issue("a@b.com").unwrap();
        let second = store.issue("a@b.com").unwrap();

        if first != second {
            assert!(store.verify("a@b.com", &first).is_err());
        }
        store.verify("a@b.com", &second).unwrap();
    }

    #[test]
    fn codes_are_per_email() {
        let mut store = OtpStore::new();
        let code_a = store.issue("a@b.com").unwrap();
        store.issue("c@d.com").unwrap();

        // a's code does not verify c's entry (unless the 1-in-900k collision hits)
        store.verify("a@b.com", &code_a).unwrap();
    }
}
