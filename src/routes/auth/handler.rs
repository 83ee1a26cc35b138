use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{Account, AuthResponse, LoginRequest, RefreshTokenResponse, SignupRequest};
use crate::{
    AppState,
    cache::SessionCacheOperations,
    error::{AppError, AppResult, map_unique_violation},
    middleware::{Session, current_user},
    routes::profile::Profile,
    utils::{Claims, generate_token, hash_password, success_to_api_response, verify_password},
};

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let req = req.validate().map_err(AppError::Validation)?;
    let password_hash = hash_password(&req.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let (account, profile) = Account::create_with_profile(&state.pool, &req, &password_hash)
        .await
        .map_err(|e| map_unique_violation(e, "Email or username is already taken"))?;

    let (token, expires_at) = generate_token(&account.id.to_string(), &state.config)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!("New account {} signed up", profile.username);

    Ok((
        StatusCode::CREATED,
        success_to_api_response(AuthResponse {
            user_id: account.id,
            username: profile.username,
            token,
            expires_at,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let account = Account::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(invalid)?;

    let valid = verify_password(&req.password, &account.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(invalid());
    }

    let profile = Profile::find_by_id(&state.pool, account.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    if profile.is_banned {
        tracing::info!("Banned account {} tried to log in", profile.username);
        return Err(AppError::Banned);
    }

    let (token, expires_at) = generate_token(&account.id.to_string(), &state.config)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(success_to_api_response(AuthResponse {
        user_id: account.id,
        username: profile.username,
        token,
        expires_at,
    }))
}

/// 登出：吊销当前会话直到令牌过期
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    SessionCacheOperations::revoke(&state.redis, &claims.sid, claims.exp)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!("Session {} signed out", claims.sid);
    Ok(success_to_api_response(Session::Anonymous))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&claims)?;
    let (token, expires_at) = generate_token(&user_id.to_string(), &state.config)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // 旧会话作废，失败不影响新令牌
    if let Err(e) = SessionCacheOperations::revoke(&state.redis, &claims.sid, claims.exp).await {
        tracing::warn!("Failed to revoke refreshed session {}: {}", claims.sid, e);
    }

    Ok(success_to_api_response(RefreshTokenResponse { token, expires_at }))
}

#[axum::debug_handler]
pub async fn session(Extension(session): Extension<Session>) -> impl IntoResponse {
    success_to_api_response(session)
}
