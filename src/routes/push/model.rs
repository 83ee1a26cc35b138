use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

/// 浏览器推送订阅，内容原样保存
#[derive(Debug, Serialize, FromRow)]
pub struct PushSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint_hash: String,
    pub subscription: Json<Value>,
    pub created_at: DateTime<Utc>,
}

/// 订阅 endpoint 的 SHA-256，同一设备只保存一份
pub fn endpoint_hash(subscription: &Value) -> Result<String, String> {
    let endpoint = subscription
        .get("endpoint")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| "Push subscription is missing its endpoint".to_string())?;
    Ok(format!("{:x}", Sha256::digest(endpoint.as_bytes())))
}

impl PushSubscription {
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        endpoint_hash: &str,
        subscription: &Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PushSubscription>(
            r#"
            INSERT INTO push_subscriptions (id, user_id, endpoint_hash, subscription, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, endpoint_hash)
            DO UPDATE SET subscription = EXCLUDED.subscription
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(endpoint_hash)
        .bind(Json(subscription))
        .fetch_one(pool)
        .await
    }
}
