// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These tests verify that tokens issued after OAuth login are accepted by
//! the verifier until their TTL elapses, and that expiry and tampering are
//! kept apart internally while both being rejected.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use kameraveiing_collector::error::AppError;
use kameraveiing_collector::middleware::auth::{verify_jwt, Claims, SESSION_TTL_SECS};
use std::time::{SystemTime, UNIX_EPOCH};

mod common;

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[test]
fn test_issue_verify_roundtrip() {
    let token = common::create_test_jwt("F1A2B3C4", SIGNING_KEY);

    let claims = verify_jwt(&token, SIGNING_KEY).expect("fresh token should verify");
    assert_eq!(claims.fid, "F1A2B3C4");
    assert_eq!(claims.sub, "internal-F1A2B3C4");
    assert!(claims.exp >= claims.iat + SESSION_TTL_SECS);
}

#[test]
fn test_expired_token_rejected_as_expired() {
    // Issue a token that expired two hours ago (beyond any decode leeway).
    let now = unix_now();
    let claims = Claims {
        sub: "internal-F1A2B3C4".to_string(),
        fid: "F1A2B3C4".to_string(),
        iat: now - SESSION_TTL_SECS,
        exp: now - 2 * 60 * 60,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    let err = verify_jwt(&token, SIGNING_KEY).unwrap_err();
    assert!(matches!(err, AppError::TokenExpired));
}

#[test]
fn test_tampered_token_rejected_as_malformed() {
    let token = common::create_test_jwt("F1A2B3C4", SIGNING_KEY);

    // Flip a character in the signature segment.
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let err = verify_jwt(&tampered, SIGNING_KEY).unwrap_err();
    assert!(matches!(err, AppError::TokenMalformed));
}

#[test]
fn test_wrong_algorithm_rejected() {
    // A token signed with HS384 must not pass the HS256-only verifier, even
    // with the correct secret.
    let now = unix_now();
    let claims = Claims {
        sub: "internal-F1A2B3C4".to_string(),
        fid: "F1A2B3C4".to_string(),
        iat: now,
        exp: now + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS384),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    let err = verify_jwt(&token, SIGNING_KEY).unwrap_err();
    assert!(matches!(err, AppError::TokenMalformed));
}

#[test]
fn test_wrong_secret_rejected() {
    let token = common::create_test_jwt("F1A2B3C4", SIGNING_KEY);

    let err = verify_jwt(&token, b"a_different_signing_key_32_byte!").unwrap_err();
    assert!(matches!(err, AppError::TokenMalformed));
}
