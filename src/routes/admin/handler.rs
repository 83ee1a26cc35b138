use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{AdminOverview, BanRequest, Category, CreateCategoryRequest};
use crate::{
    AppState,
    error::{AppError, AppResult, map_unique_violation},
    routes::profile::Profile,
    routes::showcase::ShowcaseItem,
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn overview(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let (users, showcase_items, categories) = tokio::try_join!(
        Profile::count(&state.pool),
        ShowcaseItem::count(&state.pool),
        Category::count(&state.pool),
    )?;

    Ok(success_to_api_response(AdminOverview {
        users,
        showcase_items,
        categories,
    }))
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = Profile::list_all(&state.pool).await?;
    Ok(success_to_api_response(users))
}

#[axum::debug_handler]
pub async fn approve_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let profile = Profile::set_approved(&state.pool, user_id, true)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    tracing::info!("User {} approved", profile.username);
    Ok(success_to_api_response(profile))
}

#[axum::debug_handler]
pub async fn ban_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<BanRequest>,
) -> AppResult<impl IntoResponse> {
    let profile = Profile::set_banned(&state.pool, user_id, req.banned)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    tracing::info!("User {} banned = {}", profile.username, req.banned);
    Ok(success_to_api_response(profile))
}

#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = Category::list(&state.pool).await?;
    Ok(success_to_api_response(categories))
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let name = req.validate().map_err(AppError::Validation)?;
    let category = Category::insert(&state.pool, &name)
        .await
        .map_err(|e| map_unique_violation(e, "Category already exists"))?;
    Ok((StatusCode::CREATED, success_to_api_response(category)))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    if !Category::delete(&state.pool, category_id).await? {
        return Err(AppError::NotFound("Category not found".into()));
    }
    Ok(success_to_api_response(category_id))
}

#[axum::debug_handler]
pub async fn list_showcase_items(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = ShowcaseItem::list_all(&state.pool).await?;
    Ok(success_to_api_response(items))
}

#[axum::debug_handler]
pub async fn delete_showcase_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    if !ShowcaseItem::delete_any(&state.pool, item_id).await? {
        return Err(AppError::NotFound("Showcase item not found".into()));
    }
    tracing::info!("Showcase item {} removed by an administrator", item_id);
    Ok(success_to_api_response(item_id))
}
