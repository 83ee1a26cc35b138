use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    middleware::{require_admin, require_session, resolve_session, with_locale_prefixes},
};

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod message;
pub mod profile;
pub mod push;
pub mod showcase;

/// 业务路由：公开、登录后可用、管理员三组，再加上语言前缀
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(home::landing))
        .route("/i18n/{locale}", get(home::messages))
        .route("/categories", get(home::categories))
        // 认证
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session))
        // 资料页
        .route("/explore", get(profile::explore))
        .route("/profiles/{username}", get(profile::public_profile))
        .route(
            "/profiles/{username}/items/{item_id}",
            get(profile::item_detail),
        )
        .route("/profiles/{username}/contact", post(profile::contact));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        // 个人面板
        .route("/dashboard", get(dashboard::overview))
        .route("/dashboard/profile", put(dashboard::update_profile))
        .route("/dashboard/profile/avatar", post(dashboard::upload_avatar))
        .route("/dashboard/profile/cover", post(dashboard::upload_cover))
        .route(
            "/dashboard/items",
            get(showcase::list_items).post(showcase::create_item),
        )
        .route(
            "/dashboard/items/{item_id}",
            put(showcase::update_item).delete(showcase::delete_item),
        )
        // 私信
        .route(
            "/chat/{peer_id}/messages",
            get(message::history).post(message::send_message),
        )
        .route("/chat/{peer_id}/ws", get(message::subscribe))
        .route("/push/subscriptions", post(push::subscribe))
        .route_layer(from_fn(require_session));

    let admin_routes = Router::new()
        .route("/admin", get(admin::overview))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}/approve", post(admin::approve_user))
        .route("/admin/users/{id}/ban", post(admin::ban_user))
        .route(
            "/admin/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/admin/categories/{id}",
            delete(admin::delete_category),
        )
        .route("/admin/showcase-items", get(admin::list_showcase_items))
        .route(
            "/admin/showcase-items/{id}",
            delete(admin::delete_showcase_item),
        )
        // 后添加的先执行：先要求登录，再检查管理员
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn(require_session));

    let routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes);

    with_locale_prefixes(routes)
        .layer(from_fn_with_state(state.clone(), resolve_session))
        .with_state(state)
}
