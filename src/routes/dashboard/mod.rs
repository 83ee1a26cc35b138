mod handler;
mod model;

pub use handler::{overview, update_profile, upload_avatar, upload_cover};
pub use model::{DashboardView, ProfileEditView};
