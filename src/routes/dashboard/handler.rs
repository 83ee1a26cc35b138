use axum::{
    Extension,
    extract::{Json, Multipart, State},
    response::IntoResponse,
};
use uuid::Uuid;

use super::model::{DashboardView, ProfileEditView};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::current_user,
    routes::analytics::{AnalyticsEvent, EventType},
    routes::profile::{Profile, UpdateProfileRequest},
    routes::showcase::{ItemWithImages, UploadedFile},
    storage::{Bucket, object_path},
    utils::{Claims, success_to_api_response},
};

#[axum::debug_handler]
pub async fn overview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let profile = Profile::find_by_id(&state.pool, profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    // 资料查到后其余三项并发，任一失败即返回
    let (items, profile_views, item_views) = tokio::try_join!(
        ItemWithImages::list_by_profile(&state.pool, profile_id),
        AnalyticsEvent::count(&state.pool, profile_id, EventType::ProfileView),
        AnalyticsEvent::count(&state.pool, profile_id, EventType::ItemView),
    )?;

    Ok(success_to_api_response(DashboardView {
        social_links: profile.social_links.to_pairs(),
        profile,
        items,
        profile_views,
        item_views,
    }))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let changes = req.validate().map_err(AppError::Validation)?;
    let profile = Profile::update(&state.pool, profile_id, &changes).await?;
    Ok(success_to_api_response(ProfileEditView::from(profile)))
}

/// 取表单中第一个非空文件
async fn single_file(mut multipart: Multipart) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        if !bytes.is_empty() {
            return Ok(UploadedFile {
                file_name,
                bytes: bytes.to_vec(),
            });
        }
    }
    Err(AppError::Validation("No file uploaded".into()))
}

/// 覆盖写入 `{user_id}/{file_name}`，返回公开地址
async fn store_profile_image(
    state: &AppState,
    bucket: Bucket,
    profile_id: Uuid,
    file: UploadedFile,
) -> AppResult<String> {
    let path = object_path(&profile_id.to_string(), &file.file_name)?;
    let stored = state.storage.upload(bucket, &path, file.bytes, true).await?;
    Ok(state.storage.public_url(bucket, &stored))
}

#[axum::debug_handler]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let file = single_file(multipart).await?;
    let url = store_profile_image(&state, Bucket::Avatars, profile_id, file).await?;
    let profile = Profile::set_avatar_url(&state.pool, profile_id, &url).await?;
    Ok(success_to_api_response(ProfileEditView::from(profile)))
}

#[axum::debug_handler]
pub async fn upload_cover(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let profile_id = current_user(&claims)?;
    let file = single_file(multipart).await?;
    let url = store_profile_image(&state, Bucket::Covers, profile_id, file).await?;
    let profile = Profile::set_cover_url(&state.pool, profile_id, &url).await?;
    Ok(success_to_api_response(ProfileEditView::from(profile)))
}
