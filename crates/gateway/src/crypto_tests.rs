// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── simple mode ───────────────────────────────────────────────────────

#[test]
fn simple_accepts_matching_password() {
    let crypto = Crypto::new(Method::Simple);
    assert!(crypto.validate("foobar", "foobar", ""));
}

#[test]
fn simple_rejects_mismatch() {
    let crypto = Crypto::new(Method::Simple);
    assert!(!crypto.validate("foobar", "123456", ""));
    assert!(!crypto.validate("foobar", "foobarx", ""));
    assert!(!crypto.validate("", "foobar", ""));
}

#[test]
fn simple_ignores_raw_data() {
    let crypto = Crypto::new(Method::Simple);
    assert!(crypto.validate("foobar", "foobar", "1234567890"));
}

// ── hmac_sha256 mode ──────────────────────────────────────────────────

#[test]
fn hmac_accepts_known_digest() {
    let crypto = Crypto::new(Method::HmacSha256);
    // base64(HMAC-SHA256("foobar", "1234567890"))
    assert!(crypto.validate("qEBeeU/7jdamNNZI+b4LBGRrX39qVIc20pPcZY8m5Zg=", "foobar", "1234567890"));
}

#[test]
fn hmac_rejects_plaintext_password() {
    let crypto = Crypto::new(Method::HmacSha256);
    assert!(!crypto.validate("foobar", "foobar", ""));
}

#[test]
fn hmac_rejects_empty_raw_data() {
    let crypto = Crypto::new(Method::HmacSha256);
    assert!(!crypto.validate("qEBeeU/7jdamNNZI+b4LBGRrX39qVIc20pPcZY8m5Zg=", "foobar", ""));
}

#[test]
fn hmac_rejects_perturbed_inputs() {
    let crypto = Crypto::new(Method::HmacSha256);
    // One byte off in the digest, the secret, or the signed payload.
    assert!(!crypto.validate("qEBeeU/7jdamNNZI+b4LBGRrX39qVIc20pPcZY8m5ZG=", "foobar", "1234567890"));
    assert!(!crypto.validate("qEBeeU/7jdamNNZI+b4LBGRrX39qVIc20pPcZY8m5Zg=", "foobaz", "1234567890"));
    assert!(!crypto.validate("qEBeeU/7jdamNNZI+b4LBGRrX39qVIc20pPcZY8m5Zg=", "foobar", "1234567891"));
}
