use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub bio: Option<String>,
    pub job_category: Option<String>,
    pub professional_title: Option<String>,
    pub custom_url: Option<String>,
    pub contact_email: Option<String>,
    pub social_links: Json<SocialLinks>,
    pub is_admin: bool,
    pub is_approved: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

/// 社交平台，界面只读取这几个固定键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Instagram,
    Linkedin,
    Telegram,
    Website,
    Whatsapp,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 5] = [
        SocialPlatform::Instagram,
        SocialPlatform::Linkedin,
        SocialPlatform::Telegram,
        SocialPlatform::Website,
        SocialPlatform::Whatsapp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Telegram => "telegram",
            SocialPlatform::Website => "website",
            SocialPlatform::Whatsapp => "whatsapp",
        }
    }

    pub fn link_for(&self, handle: &str) -> String {
        let handle = handle.trim();
        match self {
            SocialPlatform::Instagram => format!("https://instagram.com/{}", handle),
            SocialPlatform::Linkedin => format!("https://linkedin.com/in/{}", handle),
            SocialPlatform::Telegram => format!("https://t.me/{}", handle),
            SocialPlatform::Whatsapp => format!("https://wa.me/{}", handle),
            SocialPlatform::Website => handle.to_string(),
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unsupported social platform: {}", s.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

/// 编辑表单里的一行 `{platform, url}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinkPair {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedLink {
    pub platform: &'static str,
    pub handle: String,
    pub url: String,
}

impl SocialLinks {
    fn slot(&mut self, platform: SocialPlatform) -> &mut Option<String> {
        match platform {
            SocialPlatform::Instagram => &mut self.instagram,
            SocialPlatform::Linkedin => &mut self.linkedin,
            SocialPlatform::Telegram => &mut self.telegram,
            SocialPlatform::Website => &mut self.website,
            SocialPlatform::Whatsapp => &mut self.whatsapp,
        }
    }

    pub fn get(&self, platform: SocialPlatform) -> Option<&str> {
        let value = match platform {
            SocialPlatform::Instagram => &self.instagram,
            SocialPlatform::Linkedin => &self.linkedin,
            SocialPlatform::Telegram => &self.telegram,
            SocialPlatform::Website => &self.website,
            SocialPlatform::Whatsapp => &self.whatsapp,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// 同一平台出现多次时以最后一次为准，空值表示清除
    pub fn from_pairs(pairs: &[SocialLinkPair]) -> Result<Self, String> {
        let mut links = SocialLinks::default();
        for pair in pairs {
            let platform: SocialPlatform = pair.platform.parse()?;
            let value = pair.url.trim();
            *links.slot(platform) = (!value.is_empty()).then(|| value.to_string());
        }
        Ok(links)
    }

    pub fn to_pairs(&self) -> Vec<SocialLinkPair> {
        SocialPlatform::ALL
            .into_iter()
            .filter_map(|p| {
                self.get(p).map(|url| SocialLinkPair {
                    platform: p.as_str().to_string(),
                    url: url.to_string(),
                })
            })
            .collect()
    }

    /// 只渲染已填写的平台
    pub fn rendered(&self) -> Vec<RenderedLink> {
        SocialPlatform::ALL
            .into_iter()
            .filter_map(|p| {
                self.get(p).map(|handle| RenderedLink {
                    platform: p.as_str(),
                    handle: handle.to_string(),
                    url: p.link_for(handle),
                })
            })
            .collect()
    }
}

/// 公开资料页展示的字段
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub bio: Option<String>,
    pub job_category: Option<String>,
    pub professional_title: Option<String>,
    pub custom_url: Option<String>,
    pub is_approved: bool,
    pub has_contact_email: bool,
    pub social_links: Vec<RenderedLink>,
}

impl From<&Profile> for PublicProfile {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            full_name: p.full_name.clone(),
            avatar_url: p.avatar_url.clone(),
            cover_image_url: p.cover_image_url.clone(),
            bio: p.bio.clone(),
            job_category: p.job_category.clone(),
            professional_title: p.professional_title.clone(),
            custom_url: p.custom_url.clone(),
            is_approved: p.is_approved,
            has_contact_email: p
                .contact_email
                .as_deref()
                .is_some_and(|e| !e.trim().is_empty()),
            social_links: p.social_links.rendered(),
        }
    }
}

/// 发现页卡片
#[derive(Debug, Serialize)]
pub struct ProfileCard {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub job_category: Option<String>,
    pub bio: Option<String>,
}

impl From<Profile> for ProfileCard {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            full_name: p.full_name,
            avatar_url: p.avatar_url,
            job_category: p.job_category,
            bio: p.bio,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExploreQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ExploreQuery {
    /// 姓名或用户名包含搜索词，职业类别完全相同（均忽略大小写）
    pub fn matches(&self, profile: &Profile) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                profile.full_name.to_lowercase().contains(&term)
                    || profile.username.to_lowercase().contains(&term)
            }
        };

        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(category) => profile
                .job_category
                .as_deref()
                .is_some_and(|c| c.to_lowercase() == category.to_lowercase()),
        };

        search_ok && category_ok
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub bio: Option<String>,
    pub job_category: Option<String>,
    pub professional_title: Option<String>,
    pub custom_url: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default)]
    pub social_links: Vec<SocialLinkPair>,
}

/// 校验后的资料修改
#[derive(Debug)]
pub struct ProfileChanges {
    pub full_name: String,
    pub bio: Option<String>,
    pub job_category: Option<String>,
    pub professional_title: Option<String>,
    pub custom_url: Option<String>,
    pub contact_email: Option<String>,
    pub social_links: SocialLinks,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileChanges, String> {
        let full_name = self.full_name.trim().to_string();
        if full_name.chars().count() > 100 {
            return Err("full name must be at most 100 characters".into());
        }

        let contact_email = blank_to_none(self.contact_email);
        if let Some(email) = &contact_email {
            if !looks_like_email(email) {
                return Err(format!("invalid contact email: {}", email));
            }
        }

        Ok(ProfileChanges {
            full_name,
            bio: blank_to_none(self.bio),
            job_category: blank_to_none(self.job_category),
            professional_title: blank_to_none(self.professional_title),
            custom_url: blank_to_none(self.custom_url),
            contact_email,
            social_links: SocialLinks::from_pairs(&self.social_links)?,
        })
    }
}

/// 资料页联系表单
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(self) -> Result<Self, String> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let message = self.message.trim().to_string();

        if name.is_empty() {
            return Err("name is required".into());
        }
        if !looks_like_email(&email) {
            return Err(format!("invalid email: {}", email));
        }
        if message.is_empty() {
            return Err("message is required".into());
        }
        Ok(Self {
            name,
            email,
            message,
        })
    }
}

pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}

impl Profile {
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY created_at")
            .fetch_all(pool)
            .await
    }

    /// 发现页不展示被封禁的账号
    pub async fn list_explorable(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE is_banned = FALSE ORDER BY created_at",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET full_name = $1,
                bio = $2,
                job_category = $3,
                professional_title = $4,
                custom_url = $5,
                contact_email = $6,
                social_links = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&changes.full_name)
        .bind(&changes.bio)
        .bind(&changes.job_category)
        .bind(&changes.professional_title)
        .bind(&changes.custom_url)
        .bind(&changes.contact_email)
        .bind(Json(&changes.social_links))
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn set_avatar_url(pool: &PgPool, id: Uuid, url: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>("UPDATE profiles SET avatar_url = $1 WHERE id = $2 RETURNING *")
            .bind(url)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn set_cover_url(pool: &PgPool, id: Uuid, url: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET cover_image_url = $1 WHERE id = $2 RETURNING *",
        )
        .bind(url)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn set_approved(
        pool: &PgPool,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("UPDATE profiles SET is_approved = $1 WHERE id = $2 RETURNING *")
            .bind(approved)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_banned(
        pool: &PgPool,
        id: Uuid,
        banned: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("UPDATE profiles SET is_banned = $1 WHERE id = $2 RETURNING *")
            .bind(banned)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile(username: &str, full_name: &str, job: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: username.into(),
            full_name: full_name.into(),
            avatar_url: None,
            cover_image_url: None,
            bio: None,
            job_category: job.map(str::to_string),
            professional_title: None,
            custom_url: None,
            contact_email: Some("owner@example.com".into()),
            social_links: Json(SocialLinks::default()),
            is_admin: false,
            is_approved: false,
            is_banned: false,
            created_at: Utc::now(),
        }
    }

    fn pair(platform: &str, url: &str) -> SocialLinkPair {
        SocialLinkPair {
            platform: platform.into(),
            url: url.into(),
        }
    }

    #[test]
    fn pairs_fold_into_typed_links() {
        let links = SocialLinks::from_pairs(&[
            pair("Instagram", "shop.ir"),
            pair("telegram", "old"),
            pair("telegram", " new "),
            pair("website", ""),
        ])
        .unwrap();

        assert_eq!(links.instagram.as_deref(), Some("shop.ir"));
        assert_eq!(links.telegram.as_deref(), Some("new"));
        assert_eq!(links.website, None);
        assert_eq!(links.linkedin, None);
    }

    #[test]
    fn contact_form_is_trimmed_and_checked() {
        let ok = ContactRequest {
            name: " Sara ".into(),
            email: "sara@example.com ".into(),
            message: " hello ".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Sara");
        assert_eq!(ok.message, "hello");

        let bad_email = ContactRequest {
            name: "Sara".into(),
            email: "not-an-email".into(),
            message: "hello".into(),
        };
        assert!(bad_email.validate().is_err());

        let empty = ContactRequest {
            name: "Sara".into(),
            email: "sara@example.com".into(),
            message: "   ".into(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = SocialLinks::from_pairs(&[pair("myspace", "x")]).unwrap_err();
        assert!(err.contains("myspace"));
    }

    #[test]
    fn pairs_come_back_in_platform_order() {
        let links = SocialLinks {
            whatsapp: Some("98912".into()),
            instagram: Some("shop".into()),
            ..Default::default()
        };
        let pairs = links.to_pairs();
        assert_eq!(pairs, vec![pair("instagram", "shop"), pair("whatsapp", "98912")]);
        assert_eq!(SocialLinks::from_pairs(&pairs).unwrap(), links);
    }

    #[test]
    fn only_populated_links_render() {
        let links = SocialLinks {
            instagram: Some("shop".into()),
            linkedin: Some("  ".into()),
            telegram: Some("shopbot".into()),
            website: Some("https://shop.example".into()),
            whatsapp: None,
        };
        let rendered = links.rendered();
        let urls: Vec<_> = rendered.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://instagram.com/shop",
                "https://t.me/shopbot",
                "https://shop.example"
            ]
        );
    }

    #[test]
    fn social_links_json_ignores_unknown_keys() {
        let links: SocialLinks =
            serde_json::from_str(r#"{"instagram":"a","github":"b"}"#).unwrap();
        assert_eq!(links.instagram.as_deref(), Some("a"));
    }

    #[test]
    fn explore_matches_name_or_username() {
        let profile = sample_profile("sara_design", "Sara Ahmadi", Some("Design"));

        let by_name = ExploreQuery {
            search: Some("ahmadi".into()),
            category: None,
        };
        let by_username = ExploreQuery {
            search: Some("SARA_".into()),
            category: Some("design".into()),
        };
        let wrong_category = ExploreQuery {
            search: None,
            category: Some("photo".into()),
        };

        assert!(by_name.matches(&profile));
        assert!(by_username.matches(&profile));
        assert!(!wrong_category.matches(&profile));
        assert!(ExploreQuery::default().matches(&profile));
    }

    #[test]
    fn category_filter_skips_profiles_without_category() {
        let profile = sample_profile("nobody", "No Body", None);
        let query = ExploreQuery {
            search: None,
            category: Some("design".into()),
        };
        assert!(!query.matches(&profile));
    }

    #[test]
    fn update_request_validation() {
        let req = UpdateProfileRequest {
            full_name: "  Sara  ".into(),
            bio: Some("   ".into()),
            job_category: Some("Design".into()),
            professional_title: None,
            custom_url: None,
            contact_email: Some("sara@example.com".into()),
            social_links: vec![pair("linkedin", "sara")],
        };
        let changes = req.validate().unwrap();
        assert_eq!(changes.full_name, "Sara");
        assert_eq!(changes.bio, None);
        assert_eq!(changes.social_links.linkedin.as_deref(), Some("sara"));

        let bad = UpdateProfileRequest {
            full_name: "Sara".into(),
            bio: None,
            job_category: None,
            professional_title: None,
            custom_url: None,
            contact_email: Some("not-an-email".into()),
            social_links: vec![],
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn public_profile_hides_contact_email() {
        let profile = sample_profile("sara", "Sara", None);
        let public = PublicProfile::from(&profile);
        assert!(public.has_contact_email);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("contact_email").is_none());
    }
}
