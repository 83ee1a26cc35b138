use axum::{
    Extension,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::editor::ShowcaseEditor;
use super::form::ItemForm;
use super::model::ItemWithImages;
use crate::{
    AppState,
    error::AppResult,
    middleware::current_user,
    utils::{Claims, success_to_api_response},
};

#[axum::debug_handler]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let items = ItemWithImages::list_by_profile(&state.pool, profile_id).await?;
    Ok(success_to_api_response(items))
}

#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let form = ItemForm::from_multipart(multipart).await?;
    let created = ShowcaseEditor::new(&state, profile_id).create(form).await?;
    Ok((StatusCode::CREATED, success_to_api_response(created)))
}

#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let form = ItemForm::from_multipart(multipart).await?;
    let updated = ShowcaseEditor::new(&state, profile_id)
        .update(item_id, form)
        .await?;
    Ok(success_to_api_response(updated))
}

#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    ShowcaseEditor::new(&state, profile_id).delete(item_id).await?;
    Ok(success_to_api_response(item_id))
}
