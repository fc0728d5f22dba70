// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

//! Password hashing (PBKDF2-HMAC-SHA256).
//!
//! Hashes are stored as `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
//! The iteration count is part of the encoding, so it can be raised without
//! invalidating existing hashes.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::{
    digest, pbkdf2,
    rand::{SecureRandom, SystemRandom},
};

const ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Iteration count for newly created hashes.
const ITERATIONS: NonZeroU32 = NonZeroU32::new(120_000).unwrap();

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("system random generator failure")]
    Rng,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| PasswordError::Rng)?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(ALGORITHM, ITERATIONS, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{SCHEME}${}${}${}",
        ITERATIONS,
        Base64::encode_string(&salt),
        Base64::encode_string(&hash)
    ))
}

/// Verify a password against a stored hash.
///
/// Returns `false` for any mismatch; a stored hash that does not parse is
/// logged and treated as a mismatch rather than an error.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Some((iterations, salt, hash)) = parse_encoded(encoded) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };

    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

fn parse_encoded(encoded: &str) -> Option<(NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = NonZeroU32::new(parts.next()?.parse().ok()?)?;
    let salt = Base64::decode_vec(parts.next()?).ok()?;
    let hash = Base64::decode_vec(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((iterations, salt, hash))
}
