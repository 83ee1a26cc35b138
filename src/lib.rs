use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use config::Config;
use i18n::I18n;
use mailer::{ContactMailer, LogMailer, ResendMailer};
use realtime::MessageFeed;
use redis::Client as RedisClient;
use sqlx::PgPool;
use storage::{LocalObjectStore, ObjectStore};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod cache;
pub mod config;
pub mod error;
pub mod i18n;
pub mod mailer;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod storage;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub storage: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn ContactMailer>,
    pub feed: MessageFeed,
    pub i18n: Arc<I18n>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, redis: Arc<RedisClient>) -> Self {
        let storage: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
            config.storage_root.clone(),
            &config.public_base_url,
        ));

        let mailer: Arc<dyn ContactMailer> = match &config.resend_api_key {
            Some(key) => Arc::new(ResendMailer::new(key.clone(), config.mail_from.clone())),
            None => {
                tracing::warn!("RESEND_API_KEY not set, contact emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        Self {
            feed: MessageFeed::new(config.realtime_buffer),
            i18n: Arc::new(I18n::new(config.messages_dir.clone())),
            pool,
            redis,
            storage,
            mailer,
            config,
        }
    }
}

/// 完整路由：业务路由、语言前缀、静态文件与错误日志
pub fn app(state: AppState) -> Router {
    let storage_root = state.config.storage_root.clone();
    let upload_limit = state.config.max_upload_bytes;

    routes::router(state)
        .nest_service("/storage", ServeDir::new(storage_root))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .layer(TraceLayer::new_for_http())
}
