use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use super::model::{PushSubscription, endpoint_hash};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::current_user,
    utils::{Claims, success_to_api_response},
};

#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(subscription): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&claims)?;
    let hash = endpoint_hash(&subscription).map_err(AppError::Validation)?;

    let stored = PushSubscription::upsert(&state.pool, user_id, &hash, &subscription).await?;
    tracing::info!("Push subscription {} stored for {}", stored.id, user_id);
    Ok((StatusCode::CREATED, success_to_api_response(stored)))
}
