//! 需要 PostgreSQL 的用例，读取 `DATABASE_URL`；未设置时跳过。
//! Redis 指向不可达地址，会话检查按失败放行处理。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use vitrito::{
    AppState, app,
    config::Config,
    error::NOT_AUTHORIZED_MESSAGE,
    routes::analytics::{AnalyticsEvent, EventType},
    routes::auth::{Account, SignupRequest},
    routes::profile::Profile,
    routes::push::{PushSubscription, endpoint_hash},
    storage::{Bucket, LocalObjectStore, ObjectStore, StorageError},
    utils::generate_token,
};

const BOUNDARY: &str = "vitrito-db-boundary";

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(pool)
}

fn test_config(storage_root: PathBuf) -> Config {
    Config {
        database_url: String::new(),
        redis_url: "redis://127.0.0.1:1/".into(),
        jwt_secret: "db-test-secret".into(),
        jwt_expiration_secs: 3600,
        rate_limit_window_secs: 60,
        rate_limit_requests: 100,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        storage_root,
        public_base_url: "http://localhost:3000".into(),
        messages_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/messages")),
        resend_api_key: None,
        mail_from: "test@vitrito.local".into(),
        realtime_buffer: 16,
        max_upload_bytes: 1024 * 1024,
    }
}

/// 文件名为 broken.png 的上传失败，其余写入本地磁盘
struct FlakyStore {
    inner: LocalObjectStore,
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Vec<u8>,
        upsert: bool,
    ) -> Result<String, StorageError> {
        if path.ends_with("-broken.png") {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.inner.upload(bucket, path, bytes, upsert).await
    }

    async fn remove(&self, bucket: Bucket, path: &str) -> Result<(), StorageError> {
        self.inner.remove(bucket, path).await
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }
}

struct TestApp {
    router: Router,
    pool: PgPool,
    config: Config,
    _storage: TempDir,
}

impl TestApp {
    fn new(pool: PgPool) -> Self {
        let storage = TempDir::new().unwrap();
        let config = test_config(storage.path().to_path_buf());
        let redis = Arc::new(redis::Client::open(config.redis_url.clone()).unwrap());
        let mut state = AppState::new(pool.clone(), config.clone(), redis);
        state.storage = Arc::new(FlakyStore {
            inner: LocalObjectStore::new(config.storage_root.clone(), &config.public_base_url),
        });

        Self {
            router: app(state),
            pool,
            config,
            _storage: storage,
        }
    }

    async fn create_user(&self) -> Profile {
        let tag = Uuid::new_v4().simple().to_string()[..12].to_string();
        let req = SignupRequest {
            email: format!("{}@vitrito.test", tag),
            password: "secret-password".into(),
            username: format!("user-{}", tag),
            full_name: "Test User".into(),
        };
        let (_, profile) = Account::create_with_profile(&self.pool, &req, "unused-hash")
            .await
            .unwrap();
        profile
    }

    fn bearer(&self, profile: &Profile) -> String {
        let (token, _) = generate_token(&profile.id.to_string(), &self.config).unwrap();
        format!("Bearer {}", token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// 把公开地址映射回存储目录中的文件
    fn stored_bytes(&self, url: &str) -> Vec<u8> {
        let prefix = format!("{}/storage/", self.config.public_base_url);
        let relative = url.strip_prefix(&prefix).unwrap();
        std::fs::read(self.config.storage_root.join(relative)).unwrap()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// (字段名, 文件名, 内容)
fn multipart_body(fields: &[(&str, Option<&str>, &str)]) -> Body {
    let mut body = Vec::new();
    for (name, file_name, content) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

fn create_item_request(bearer: &str, fields: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/dashboard/items")
        .header(header::AUTHORIZATION, bearer)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body(fields))
        .unwrap()
}

async fn image_rows(pool: &PgPool, item_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM showcase_item_images WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn item_id(json: &Value) -> Uuid {
    json["resp_data"]["item"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn unknown_username_is_not_found() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);

    let (status, json) = app.send(get("/profiles/nobody-here-at-all")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 1004);
    assert_eq!(json["msg"], "Profile nobody-here-at-all not found");
}

#[tokio::test]
async fn each_public_page_load_records_one_view() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;
    let uri = format!("/profiles/{}", profile.username);

    assert_eq!(
        AnalyticsEvent::count(&app.pool, profile.id, EventType::ProfileView)
            .await
            .unwrap(),
        0
    );

    let (status, json) = app.send(get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["resp_data"]["total_items"], 0);
    assert_eq!(
        AnalyticsEvent::count(&app.pool, profile.id, EventType::ProfileView)
            .await
            .unwrap(),
        1
    );

    app.send(get(&format!("/en{}", uri))).await;
    assert_eq!(
        AnalyticsEvent::count(&app.pool, profile.id, EventType::ProfileView)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        AnalyticsEvent::count(&app.pool, profile.id, EventType::ItemView)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn item_without_images_stores_no_image_rows() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;

    let request = create_item_request(
        &app.bearer(&profile),
        &[("title", None, "Logo pack"), ("price", None, "12")],
    );
    let (status, json) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["resp_data"]["item"]["images"], json!([]));
    assert_eq!(json["resp_data"]["image_errors"], json!([]));
    assert_eq!(json["resp_data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(image_rows(&app.pool, item_id(&json)).await, 0);
}

#[tokio::test]
async fn same_named_images_are_both_kept() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;

    let request = create_item_request(
        &app.bearer(&profile),
        &[
            ("title", None, "Sneakers"),
            ("images", Some("image.jpg"), "FIRST-IMAGE"),
            ("images", Some("image.jpg"), "SECOND-IMAGE"),
        ],
    );
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);

    let images = json["resp_data"]["item"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    let first = images[0]["image_url"].as_str().unwrap();
    let second = images[1]["image_url"].as_str().unwrap();
    assert_ne!(first, second);

    let mut stored = vec![app.stored_bytes(first), app.stored_bytes(second)];
    stored.sort();
    assert_eq!(stored, vec![b"FIRST-IMAGE".to_vec(), b"SECOND-IMAGE".to_vec()]);
    assert_eq!(image_rows(&app.pool, item_id(&json)).await, 2);
}

#[tokio::test]
async fn failed_image_is_reported_and_the_rest_are_saved() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;

    let request = create_item_request(
        &app.bearer(&profile),
        &[
            ("title", None, "Prints"),
            ("images", Some("front.png"), "front"),
            ("images", Some("broken.png"), "broken"),
            ("images", Some("back.png"), "back"),
        ],
    );
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);

    let errors = json["resp_data"]["image_errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["file_name"], "broken.png");
    assert!(errors[0]["error"].as_str().unwrap().contains("disk full"));

    assert_eq!(json["resp_data"]["item"]["images"].as_array().unwrap().len(), 2);
    assert_eq!(image_rows(&app.pool, item_id(&json)).await, 2);
}

#[tokio::test]
async fn replacing_a_digital_file_keeps_the_old_object() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;
    let bearer = app.bearer(&profile);

    let (status, json) = app
        .send(create_item_request(
            &bearer,
            &[
                ("title", None, "Ebook"),
                ("is_digital", None, "true"),
                ("digital_file", Some("book.pdf"), "v1"),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = item_id(&json);
    let old_url = json["resp_data"]["item"]["digital_file_url"]
        .as_str()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/dashboard/items/{}", id))
        .header(header::AUTHORIZATION, &bearer)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body(&[("digital_file", Some("book.pdf"), "v2")]))
        .unwrap();
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let new_url = json["resp_data"]["item"]["digital_file_url"].as_str().unwrap();
    assert_ne!(new_url, old_url);
    assert_eq!(app.stored_bytes(new_url), b"v2");
    assert_eq!(app.stored_bytes(&old_url), b"v1");
}

#[tokio::test]
async fn non_admin_gets_the_fixed_message() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;

    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, app.bearer(&profile))
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["msg"], NOT_AUTHORIZED_MESSAGE);

    sqlx::query("UPDATE profiles SET is_admin = TRUE WHERE id = $1")
        .bind(profile.id)
        .execute(&app.pool)
        .await
        .unwrap();
    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, app.bearer(&profile))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn push_subscription_is_stored_once_per_endpoint() {
    let Some(pool) = test_pool().await else { return };
    let app = TestApp::new(pool);
    let profile = app.create_user().await;

    let first = json!({"endpoint": "https://push.example/device", "keys": {"auth": "1"}});
    let second = json!({"endpoint": "https://push.example/device", "keys": {"auth": "2"}});
    let hash = endpoint_hash(&first).unwrap();

    let a = PushSubscription::upsert(&app.pool, profile.id, &hash, &first)
        .await
        .unwrap();
    let b = PushSubscription::upsert(&app.pool, profile.id, &hash, &second)
        .await
        .unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(b.subscription.0["keys"]["auth"], "2");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM push_subscriptions WHERE user_id = $1")
        .bind(profile.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}
