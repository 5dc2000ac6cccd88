///! Integration test for JWT token issuance and validation.
///!
///! Tokens are minted and verified with a local HS256 secret, so no running
///! server or database is needed.
///!
///! Run with: `cargo test --test auth_test`
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use roadside_assist_backend::entities::user::UserRole;
use roadside_assist_backend::utils::jwt::{create_token, verify_token, Claims};

const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

#[test]
fn test_token_roundtrip() {
    let user_id = Uuid::new_v4();
    let token = create_token(user_id, "alice@example.com", UserRole::Customer, TEST_SECRET, 24)
        .expect("Token should be created");

    let claims = verify_token(&token, TEST_SECRET).expect("Token should be valid");

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "alice@example.com");
    assert_eq!(claims.role, UserRole::Customer);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_wrong_secret_is_rejected() {
    let token = create_token(
        Uuid::new_v4(),
        "bob@example.com",
        UserRole::Technician,
        TEST_SECRET,
        24,
    )
    .expect("Token should be created");

    assert!(verify_token(&token, "a-completely-different-secret").is_err());
}

#[test]
fn test_expired_token_is_rejected() {
    let now = Utc::now() - Duration::hours(2);
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: "carol@example.com".to_string(),
        role: UserRole::Admin,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to encode test JWT");

    assert!(verify_token(&token, TEST_SECRET).is_err());
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(verify_token("not.a.jwt", TEST_SECRET).is_err());
}
