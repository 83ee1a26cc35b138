use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    AppState,
    error::{AppError, AppResult},
    i18n::{Locale, UnsupportedLocale},
    routes::admin::Category,
    utils::success_to_api_response,
};

#[derive(Debug, Serialize)]
pub struct Landing {
    pub locale: Locale,
    pub title: String,
    pub subtitle: String,
    pub explore: String,
    pub signup: String,
}

#[axum::debug_handler]
pub async fn landing(State(state): State<AppState>, locale: Locale) -> impl IntoResponse {
    let t = state.i18n.translator(locale).await;
    success_to_api_response(Landing {
        locale: t.locale(),
        title: t.t("Home.title"),
        subtitle: t.t("Home.subtitle"),
        explore: t.t("Home.explore"),
        signup: t.t("Home.signup"),
    })
}

/// 整个文案表，不支持的语言返回 404
#[axum::debug_handler]
pub async fn messages(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> AppResult<impl IntoResponse> {
    let locale: Locale = locale
        .parse()
        .map_err(|UnsupportedLocale(name)| AppError::NotFound(format!("Unsupported locale: {}", name)))?;
    let bundle = state.i18n.bundle(locale).await;
    Ok(success_to_api_response(bundle.as_ref().clone()))
}

#[axum::debug_handler]
pub async fn categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = Category::list(&state.pool).await?;
    Ok(success_to_api_response(categories))
}
