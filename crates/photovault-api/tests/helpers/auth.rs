use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use photovault_api::auth::JwtClaims;

/// Test JWT secret (must match `test_config`).
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// Mint an HS256 token for `principal`, valid for an hour.
pub fn token_for(principal: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: principal.to_string(),
        exp: now + 3600,
        iat: now,
        nbf: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token")
}

/// `Authorization` header value for `principal`.
pub fn bearer(principal: &str) -> String {
    format!("Bearer {}", token_for(principal))
}
