use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    cache::SessionCacheOperations,
    error::AppError,
    i18n::Locale,
    routes::profile::Profile,
    utils::{Claims, verify_token},
};

/// 当前请求的会话状态
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Session {
    Authenticated(Claims),
    Anonymous,
}

impl Session {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Session::Authenticated(claims) => Some(claims),
            Session::Anonymous => None,
        }
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// 先取 Authorization 头，浏览器 WebSocket 无法设置请求头时使用 access_token 参数
fn bearer_token(req: &Request<Body>) -> Option<String> {
    if let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.access_token)
        .filter(|t| !t.is_empty())
}

async fn resolve(state: &AppState, token: Option<String>) -> Session {
    let Some(token) = token else {
        return Session::Anonymous;
    };

    let claims = match verify_token(&token, &state.config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return Session::Anonymous;
        }
    };

    match SessionCacheOperations::is_revoked(&state.redis, &claims.sid).await {
        Ok(true) => {
            tracing::debug!("Session {} has been signed out", claims.sid);
            Session::Anonymous
        }
        Ok(false) => Session::Authenticated(claims),
        Err(e) => {
            tracing::warn!("Session revocation lookup failed: {}", e);
            Session::Authenticated(claims)
        }
    }
}

/// 每个请求解析一次会话，从不拒绝请求
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = resolve(&state, bearer_token(&req)).await;

    if let Session::Authenticated(claims) = &session {
        req.extensions_mut().insert(claims.clone());
    }
    req.extensions_mut().insert(session);

    next.run(req).await
}

/// 未登录访问受保护页面时重定向到当前语言的登录页
pub async fn require_session(locale: Locale, req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<Session>() {
        Some(Session::Authenticated(_)) => next.run(req).await,
        _ => Redirect::to(&locale.localized_path("/login")).into_response(),
    }
}

/// 会话中的用户 id
pub fn current_user(claims: &Claims) -> Result<Uuid, AppError> {
    claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Invalid session subject".into()))
}

/// 管理员判定
pub struct AdminGate;

impl AdminGate {
    pub fn check(profile: Option<&Profile>) -> Result<(), AppError> {
        match profile {
            Some(profile) if profile.is_admin && !profile.is_banned => Ok(()),
            _ => Err(AppError::NotAuthorized),
        }
    }
}

/// 非管理员显示固定提示，不做重定向
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .extensions()
        .get::<Claims>()
        .and_then(Claims::user_id)
        .ok_or(AppError::NotAuthorized)?;

    let profile = Profile::find_by_id(&state.pool, user_id).await?;
    AdminGate::check(profile.as_ref())?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::profile::SocialLinks;
    use axum::http::header::AUTHORIZATION;
    use chrono::Utc;

    fn profile(is_admin: bool, is_banned: bool) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: "admin".into(),
            full_name: "Admin".into(),
            avatar_url: None,
            cover_image_url: None,
            bio: None,
            job_category: None,
            professional_title: None,
            custom_url: None,
            contact_email: None,
            social_links: sqlx::types::Json(SocialLinks::default()),
            is_admin,
            is_approved: true,
            is_banned,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_gate_requires_flag() {
        assert!(AdminGate::check(Some(&profile(true, false))).is_ok());
        assert!(matches!(
            AdminGate::check(Some(&profile(false, false))),
            Err(AppError::NotAuthorized)
        ));
        assert!(AdminGate::check(Some(&profile(true, true))).is_err());
        assert!(AdminGate::check(None).is_err());
    }

    #[test]
    fn bearer_header_wins_over_query() {
        let req = Request::builder()
            .uri("/chat/x/ws?access_token=from-query")
            .header(AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn query_token_is_used_for_websockets() {
        let req = Request::builder()
            .uri("/chat/x/ws?access_token=from-query")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("from-query"));

        let req = Request::builder().uri("/dashboard").body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }
}
