use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    // 对象存储根目录与公开访问地址
    pub storage_root: PathBuf,
    pub public_base_url: String,
    // 语言包目录
    pub messages_dir: PathBuf,
    // 未配置时使用日志发信
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub realtime_buffer: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")?
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(24);
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            rate_limit_window_secs: optional_var("RATE_LIMIT_WINDOW")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            rate_limit_requests: optional_var("RATE_LIMIT_REQUESTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            storage_root: optional_var("STORAGE_ROOT")
                .unwrap_or_else(|| "./storage".into())
                .into(),
            public_base_url: optional_var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            messages_dir: optional_var("MESSAGES_DIR")
                .unwrap_or_else(|| "./messages".into())
                .into(),
            resend_api_key: optional_var("RESEND_API_KEY").filter(|k| !k.trim().is_empty()),
            mail_from: optional_var("MAIL_FROM").unwrap_or_else(|| "onboarding@resend.dev".into()),
            realtime_buffer: optional_var("REALTIME_BUFFER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            max_upload_bytes: optional_var("MAX_UPLOAD_MB")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(20)
                * 1024
                * 1024,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok()
}
