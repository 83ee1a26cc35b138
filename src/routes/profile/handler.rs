use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use super::model::{ContactRequest, ExploreQuery, Profile, ProfileCard, PublicProfile};
use crate::{
    AppState,
    error::{AppError, AppResult},
    mailer::ContactEmail,
    routes::analytics::{AnalyticsEvent, EventType},
    routes::showcase::{ItemImage, ItemWithImages, ShowcaseFilter, ShowcaseItem},
    utils::success_to_api_response,
};

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub profile: PublicProfile,
    pub items: Vec<ItemWithImages>,
    pub total_items: usize,
}

async fn find_public(state: &AppState, username: &str) -> AppResult<Profile> {
    Profile::find_by_username(&state.pool, username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", username)))
}

/// 埋点失败只记录日志，不影响页面
async fn record_view(state: &AppState, profile_id: Uuid, event_type: EventType, item_id: Option<Uuid>) {
    if let Err(e) = AnalyticsEvent::record(&state.pool, profile_id, event_type, item_id).await {
        tracing::warn!("Failed to record {} for {}: {}", event_type.as_str(), profile_id, e);
    }
}

#[axum::debug_handler]
pub async fn public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(filter): Query<ShowcaseFilter>,
) -> AppResult<impl IntoResponse> {
    let profile = find_public(&state, &username).await?;
    record_view(&state, profile.id, EventType::ProfileView, None).await;

    let items = ItemWithImages::list_active_by_profile(&state.pool, profile.id).await?;
    let total_items = items.len();

    Ok(success_to_api_response(ProfilePage {
        profile: PublicProfile::from(&profile),
        items: filter.visible(&items),
        total_items,
    }))
}

#[axum::debug_handler]
pub async fn item_detail(
    State(state): State<AppState>,
    Path((username, item_id)): Path<(String, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let profile = find_public(&state, &username).await?;

    let item = ShowcaseItem::find_by_id(&state.pool, item_id)
        .await?
        .filter(|item| item.profile_id == profile.id && item.is_active)
        .ok_or_else(|| AppError::NotFound("Showcase item not found".into()))?;

    record_view(&state, profile.id, EventType::ItemView, Some(item.id)).await;

    let images = ItemImage::list_for_items(&state.pool, &[item.id]).await?;
    Ok(success_to_api_response(ItemWithImages { item, images }))
}

#[axum::debug_handler]
pub async fn contact(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<ContactRequest>,
) -> AppResult<impl IntoResponse> {
    let req = req.validate().map_err(AppError::Validation)?;
    let profile = find_public(&state, &username).await?;

    let profile_email = profile
        .contact_email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::NotFound("Profile has no contact email".into()))?;

    state
        .mailer
        .send_contact(ContactEmail {
            name: req.name,
            email: req.email,
            message: req.message,
            profile_email,
        })
        .await?;

    tracing::info!("Contact message delivered for {}", username);
    Ok(success_to_api_response(true))
}

#[axum::debug_handler]
pub async fn explore(
    State(state): State<AppState>,
    Query(query): Query<ExploreQuery>,
) -> AppResult<impl IntoResponse> {
    let profiles = Profile::list_explorable(&state.pool).await?;
    let cards: Vec<ProfileCard> = profiles
        .into_iter()
        .filter(|p| query.matches(p))
        .map(ProfileCard::from)
        .collect();
    Ok(success_to_api_response(cards))
}
