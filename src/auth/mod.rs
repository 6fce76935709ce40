//! JWT authentication and role checks for the back office.
//!
//! Tokens are HS256 JWTs carrying the user's id, email and role. Passwords
//! are stored as bcrypt hashes; hashing runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Role, User};

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from `JWT_SECRET`.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Who is making the request, inserted as a request extension by [`require_role`].
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// No `JWT_SECRET` configured
    Disabled,
    User(Claims),
}

/// Middleware admitting requests whose bearer token carries at least `required`.
///
/// When no keys are configured every request passes through.
pub async fn require_role(
    keys: Option<Arc<JwtKeys>>,
    required: Role,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(keys) = keys else {
        request.extensions_mut().insert(AuthContext::Disabled);
        return next.run(request).await;
    };

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    let Some(token) = bearer else {
        return AppError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    let claims = match keys.verify(&token) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    if !claims.role.satisfies(required) {
        tracing::debug!(
            "User {} with role {} denied, {} required",
            claims.email,
            claims.role.as_str(),
            required.as_str()
        );
        return AppError::Forbidden(format!("Requires {} role", required.as_str())).into_response();
    }

    request.extensions_mut().insert(AuthContext::User(claims));
    next.run(request).await
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Well-formed hash that no password matches. Logins for unknown emails are
/// checked against it so they take as long as a wrong password.
pub fn decoy_hash(cost: u32) -> Option<String> {
    match bcrypt::hash(uuid::Uuid::new_v4().to_string(), cost) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::warn!("Failed to build decoy password hash: {}", e);
            None
        }
    }
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?;
    Ok(verified.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            email: "manager@example.com".to_string(),
            password_hash: String::new(),
            name: "Manager".to_string(),
            role,
            is_active: true,
            last_login: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let keys = JwtKeys::new("test-secret", 24);
        let token = keys.issue(&user(Role::Manager)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = JwtKeys::new("secret-a", 24).issue(&user(Role::Admin)).unwrap();
        let err = JwtKeys::new("secret-b", 24).verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new("test-secret", -2);
        let token = keys.issue(&user(Role::Staff)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("s3cret!".to_string(), 4).await.unwrap();
        assert!(verify_password("s3cret!".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
        assert!(!verify_password("s3cret!".to_string(), "not-a-hash".to_string())
            .await
            .unwrap());
    }

    #[test]
    fn test_decoy_hash_is_well_formed() {
        let hash = decoy_hash(4).unwrap();
        // A parse failure would return early without doing the bcrypt work
        assert!(!bcrypt::verify("s3cret!", &hash).unwrap());
        assert!(!bcrypt::verify("", &hash).unwrap());
    }
}
