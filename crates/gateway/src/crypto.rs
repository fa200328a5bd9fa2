// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential validator for client logons.

use base64::Engine as _;

/// Validation mode, selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Plaintext comparison of password against the configured secret.
    #[default]
    Simple,
    /// Password must equal `base64(HMAC-SHA256(secret, raw_data))`.
    HmacSha256,
}

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Credential validator. All comparisons are constant-time.
#[derive(Debug, Clone, Copy)]
pub struct Crypto {
    method: Method,
}

impl Crypto {
    pub fn new(method: Method) -> Self {
        Self { method }
    }

    /// Validate a logon `password` against the user's configured `secret`.
    ///
    /// In [`Method::HmacSha256`] mode the `raw_data` field (FIX tag 96) is
    /// the signed payload; an empty `raw_data` always fails.
    pub fn validate(&self, password: &str, secret: &str, raw_data: &str) -> bool {
        match self.method {
            Method::Simple => constant_time_eq(password, secret),
            Method::HmacSha256 => {
                if raw_data.is_empty() {
                    return false;
                }
                let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_bytes());
                let digest = ring::hmac::sign(&key, raw_data.as_bytes());
                let encoded = base64::engine::general_purpose::STANDARD.encode(digest.as_ref());
                constant_time_eq(password, &encoded)
            }
        }
    }
}

#[cfg(test)]
#[path = "crypto_tests.rs"]
mod tests;
