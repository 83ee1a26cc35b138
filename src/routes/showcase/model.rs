use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShowcaseItem {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Option<f64>,
    pub is_active: bool,
    pub is_digital: bool,
    pub digital_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemImage {
    pub id: Uuid,
    pub item_id: Uuid,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// 展示项及其全部图片，图片按上传先后排列
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithImages {
    #[serde(flatten)]
    pub item: ShowcaseItem,
    pub images: Vec<ItemImage>,
}

/// 写入展示项的字段
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Option<f64>,
    pub is_active: bool,
    pub is_digital: bool,
}

/// 空字符串视为未设置
fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// 公开页的本地筛选条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowcaseFilter {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<f64>,
}

impl ShowcaseFilter {
    pub fn matches(&self, item: &ShowcaseItem) -> bool {
        // 未标价按 0 计
        let price = item.price.unwrap_or(0.0);

        let title_ok = self
            .title
            .as_deref()
            .is_none_or(|t| item.title.to_lowercase().contains(&t.to_lowercase()));
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| item.category.to_lowercase() == c.to_lowercase());
        let min_ok = self.min_price.is_none_or(|min| price >= min);
        let max_ok = self.max_price.is_none_or(|max| price <= max);

        title_ok && category_ok && min_ok && max_ok
    }

    /// 公开页可见项：只保留上架且满足筛选的项
    pub fn visible(&self, items: &[ItemWithImages]) -> Vec<ItemWithImages> {
        items
            .iter()
            .filter(|entry| entry.item.is_active && self.matches(&entry.item))
            .cloned()
            .collect()
    }
}

impl ShowcaseItem {
    pub async fn list_active_by_profile(
        pool: &PgPool,
        profile_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>(
            r#"
            SELECT * FROM showcase_items
            WHERE profile_id = $1 AND is_active = TRUE
            ORDER BY created_at
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_profile(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>(
            "SELECT * FROM showcase_items WHERE profile_id = $1 ORDER BY created_at",
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>("SELECT * FROM showcase_items ORDER BY created_at")
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM showcase_items")
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, item_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>("SELECT * FROM showcase_items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(pool)
            .await
    }

    /// 只查找属于该资料的展示项
    pub async fn find_owned(
        pool: &PgPool,
        item_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>(
            "SELECT * FROM showcase_items WHERE id = $1 AND profile_id = $2",
        )
        .bind(item_id)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn insert(
        pool: &PgPool,
        id: Uuid,
        profile_id: Uuid,
        fields: &ItemFields,
        digital_file_url: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>(
            r#"
            INSERT INTO showcase_items
                (id, profile_id, title, description, category, price,
                 is_active, is_digital, digital_file_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(profile_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.price)
        .bind(fields.is_active)
        .bind(fields.is_digital)
        .bind(digital_file_url)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        item_id: Uuid,
        profile_id: Uuid,
        fields: &ItemFields,
        digital_file_url: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShowcaseItem>(
            r#"
            UPDATE showcase_items
            SET title = $1,
                description = $2,
                category = $3,
                price = $4,
                is_active = $5,
                is_digital = $6,
                digital_file_url = $7
            WHERE id = $8 AND profile_id = $9
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.price)
        .bind(fields.is_active)
        .bind(fields.is_digital)
        .bind(digital_file_url)
        .bind(item_id)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
    }

    /// 只删除数据行，存储中的图片与文件保留
    pub async fn delete(
        pool: &PgPool,
        item_id: Uuid,
        profile_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM showcase_items WHERE id = $1 AND profile_id = $2")
            .bind(item_id)
            .bind(profile_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_any(pool: &PgPool, item_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM showcase_items WHERE id = $1")
            .bind(item_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl ItemImage {
    pub async fn insert(pool: &PgPool, item_id: Uuid, image_url: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ItemImage>(
            r#"
            INSERT INTO showcase_item_images (id, item_id, image_url, created_at)
            VALUES ($1, $2, $3, clock_timestamp())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item_id)
        .bind(image_url)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_items(pool: &PgPool, item_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, ItemImage>(
            r#"
            SELECT * FROM showcase_item_images
            WHERE item_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(item_ids)
        .fetch_all(pool)
        .await
    }
}

impl ItemWithImages {
    /// 把图片行按展示项分组挂上去
    pub fn join(items: Vec<ShowcaseItem>, images: Vec<ItemImage>) -> Vec<Self> {
        let mut by_item: HashMap<Uuid, Vec<ItemImage>> = HashMap::new();
        for image in images {
            by_item.entry(image.item_id).or_default().push(image);
        }

        items
            .into_iter()
            .map(|item| {
                let images = by_item.remove(&item.id).unwrap_or_default();
                ItemWithImages { item, images }
            })
            .collect()
    }

    pub async fn load(pool: &PgPool, items: Vec<ShowcaseItem>) -> Result<Vec<Self>, sqlx::Error> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let images = ItemImage::list_for_items(pool, &ids).await?;
        Ok(Self::join(items, images))
    }

    pub async fn list_by_profile(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let items = ShowcaseItem::list_by_profile(pool, profile_id).await?;
        Self::load(pool, items).await
    }

    pub async fn list_active_by_profile(
        pool: &PgPool,
        profile_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let items = ShowcaseItem::list_active_by_profile(pool, profile_id).await?;
        Self::load(pool, items).await
    }
}
