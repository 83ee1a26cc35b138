//! 缓存操作
//! 会话吊销与限流计数都放在 Redis 中

use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

/// 已吊销会话键前缀
const REVOKED_SESSION_PREFIX: &str = "session:revoked:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

pub fn revoked_session_key(session_id: &str) -> String {
    format!("{}{}", REVOKED_SESSION_PREFIX, session_id)
}

pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}

/// 会话缓存操作
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// 吊销会话，保留到令牌自然过期
    pub async fn revoke(
        redis: &Arc<RedisClient>,
        session_id: &str,
        expires_at: i64,
    ) -> Result<(), redis::RedisError> {
        let ttl = expires_at - chrono::Utc::now().timestamp();
        if ttl <= 0 {
            return Ok(());
        }

        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(revoked_session_key(session_id), 1u8, ttl as u64)
            .await?;
        Ok(())
    }

    pub async fn is_revoked(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        conn.exists(revoked_session_key(session_id)).await
    }
}

/// 限流计数操作
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// 计数加一，窗口内首次请求时设置过期时间
    pub async fn hit(
        redis: &Arc<RedisClient>,
        ip: &str,
        window_secs: u64,
    ) -> Result<i64, redis::RedisError> {
        let key = rate_limit_key(ip);
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let count: i64 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&key, window_secs as i64).await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        assert_eq!(revoked_session_key("abc"), "session:revoked:abc");
        assert_eq!(rate_limit_key("10.0.0.1"), "rate_limit:10.0.0.1");
    }

    #[tokio::test]
    async fn expired_sessions_need_no_revocation() {
        // 已过期的令牌不会访问 Redis
        let client = Arc::new(RedisClient::open("redis://127.0.0.1:1/").unwrap());
        let past = chrono::Utc::now().timestamp() - 10;
        assert!(SessionCacheOperations::revoke(&client, "sid", past).await.is_ok());
    }
}
