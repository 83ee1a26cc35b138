mod handler;
mod model;

pub use handler::{ProfilePage, contact, explore, item_detail, public_profile};
pub use model::{
    ContactRequest, ExploreQuery, Profile, ProfileCard, ProfileChanges, PublicProfile,
    RenderedLink, SocialLinkPair, SocialLinks, SocialPlatform, UpdateProfileRequest,
    looks_like_email,
};
