use serde::Serialize;

use crate::routes::profile::{Profile, SocialLinkPair};
use crate::routes::showcase::ItemWithImages;

/// 个人面板
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub profile: Profile,
    pub social_links: Vec<SocialLinkPair>,
    pub items: Vec<ItemWithImages>,
    pub profile_views: i64,
    pub item_views: i64,
}

/// 编辑资料后的返回，社交链接按编辑表单的形式给出
#[derive(Debug, Serialize)]
pub struct ProfileEditView {
    pub profile: Profile,
    pub social_links: Vec<SocialLinkPair>,
}

impl From<Profile> for ProfileEditView {
    fn from(profile: Profile) -> Self {
        Self {
            social_links: profile.social_links.to_pairs(),
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::profile::SocialLinks;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    #[test]
    fn edit_view_exposes_links_as_pairs() {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: "nima".into(),
            full_name: "Nima".into(),
            avatar_url: None,
            cover_image_url: None,
            bio: None,
            job_category: None,
            professional_title: None,
            custom_url: None,
            contact_email: None,
            social_links: Json(SocialLinks {
                telegram: Some("nima_shop".into()),
                ..Default::default()
            }),
            is_admin: false,
            is_approved: false,
            is_banned: false,
            created_at: Utc::now(),
        };

        let view = ProfileEditView::from(profile);
        assert_eq!(view.social_links.len(), 1);
        assert_eq!(view.social_links[0].platform, "telegram");
        assert_eq!(view.social_links[0].url, "nima_shop");
    }
}
