mod handler;
mod model;

pub use handler::{
    approve_user,
    ban_user,
    create_category,
    delete_category,
    delete_showcase_item,
    list_categories,
    list_showcase_items,
    list_users,
    overview,
};
pub use model::{AdminOverview, BanRequest, Category, CreateCategoryRequest};
