//! Back-office authentication endpoints.

use axum::extract::State;
use axum::Extension;

use super::{error, success, ApiJson, ApiResult};
use crate::auth::{hash_password, verify_password, AuthContext};
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

/// POST /api/auth/login - Exchange credentials for a token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let Some(keys) = state.keys.clone() else {
        return error(
            AppError::Internal("Authentication is not configured".to_string()),
            revision_id,
        );
    };

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = match state.repo.find_user_by_email(&request.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            if let Some(decoy) = &state.decoy_hash {
                let _ = verify_password(request.password, decoy.to_string()).await;
            }
            return error(invalid(), revision_id);
        }
        Err(e) => return error(e, revision_id),
    };

    match verify_password(request.password, user.password_hash.clone()).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Failed login for {}", user.email);
            return error(invalid(), revision_id);
        }
        Err(e) => return error(e, revision_id),
    }

    if !user.is_active {
        return error(
            AppError::Unauthorized("Account is disabled".to_string()),
            revision_id,
        );
    }

    let last_login = match state.repo.touch_last_login(&user.id).await {
        Ok(ts) => ts,
        Err(e) => return error(e, revision_id),
    };
    let user = User {
        last_login: Some(last_login),
        ..user
    };

    match keys.issue(&user) {
        Ok(token) => success(LoginResponse { token, user }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/register - Create a back-office user (admin only).
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<User> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return error(
            AppError::Validation("A valid email is required".to_string()),
            revision_id,
        );
    }
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return error(
            AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )),
            revision_id,
        );
    }

    let hash = match hash_password(request.password, state.config.bcrypt_cost).await {
        Ok(hash) => hash,
        Err(e) => return error(e, revision_id),
    };

    match state
        .repo
        .create_user(email, &hash, request.name.trim(), request.role)
        .await
    {
        Ok(user) => {
            tracing::info!("Registered {} as {}", user.email, user.role.as_str());
            success(user, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/auth/me - The user behind the bearer token.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<User> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let claims = match auth {
        AuthContext::User(claims) => claims,
        AuthContext::Disabled => {
            return error(
                AppError::BadRequest("Authentication is disabled".to_string()),
                revision_id,
            )
        }
    };

    match state.repo.get_user(&claims.sub).await {
        Ok(Some(user)) if user.is_active => success(user, revision_id),
        Ok(_) => error(
            AppError::Unauthorized("Account no longer exists or is disabled".to_string()),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}
