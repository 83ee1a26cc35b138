use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::profile::{Profile, looks_like_email};

/// 登录凭据，资料 id 与账号 id 相同
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub token: String,
    pub expires_at: i64,
}

/// 用户名：3 到 32 个字母、数字、下划线或连字符
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err("Username must be between 3 and 32 characters".into());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("Username may only contain letters, digits, '_' and '-'".into());
    }
    Ok(())
}

impl SignupRequest {
    /// 返回规范化后的请求
    pub fn validate(self) -> Result<Self, String> {
        let email = self.email.trim().to_lowercase();
        let username = self.username.trim().to_string();

        validate_username(&username)?;
        if !looks_like_email(&email) {
            return Err(format!("Invalid email: {}", email));
        }
        // bcrypt 只使用前 72 字节
        if self.password.len() < 6 || self.password.len() > 72 {
            return Err("Password must be between 6 and 72 characters".into());
        }

        Ok(Self {
            email,
            username,
            full_name: self.full_name.trim().to_string(),
            password: self.password,
        })
    }
}

impl Account {
    /// 在同一事务中创建账号与资料
    pub async fn create_with_profile(
        pool: &PgPool,
        req: &SignupRequest,
        password_hash: &str,
    ) -> Result<(Self, Profile), sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id = Uuid::new_v4();

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, username, full_name, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.username)
        .bind(&req.full_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((account, profile))
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            username: username.into(),
            full_name: " Ali Rezaei ".into(),
        }
    }

    #[test]
    fn username_rule() {
        assert!(validate_username("ali_r-99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("ali rezaei").is_err());
        assert!(validate_username("علی").is_err());
    }

    #[test]
    fn signup_is_normalised() {
        let req = signup(" ali ", " Ali@Example.COM ", "secret1").validate().unwrap();
        assert_eq!(req.username, "ali");
        assert_eq!(req.email, "ali@example.com");
        assert_eq!(req.full_name, "Ali Rezaei");
    }

    #[test]
    fn signup_rejects_bad_input() {
        assert!(signup("ali", "ali@example.com", "123").validate().is_err());
        assert!(signup("ali", "nope", "secret1").validate().is_err());
        assert!(signup("a!", "ali@example.com", "secret1").validate().is_err());
    }
}
