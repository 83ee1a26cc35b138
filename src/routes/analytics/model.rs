use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ProfileView,
    ItemView,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProfileView => "profile_view",
            EventType::ItemView => "item_view",
        }
    }
}

/// 只写的埋点表，统计时按类型计数
#[derive(Debug, Serialize, FromRow)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub item_id: Option<Uuid>,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// 每次调用都写入一行，不去重
    pub async fn record(
        pool: &PgPool,
        profile_id: Uuid,
        event_type: EventType,
        item_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            INSERT INTO analytics (id, profile_id, item_id, event_type, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(item_id)
        .bind(event_type.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn count(
        pool: &PgPool,
        profile_id: Uuid,
        event_type: EventType,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM analytics WHERE profile_id = $1 AND event_type = $2",
        )
        .bind(profile_id)
        .bind(event_type.as_str())
        .fetch_one(pool)
        .await
    }
}
