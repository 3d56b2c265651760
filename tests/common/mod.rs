#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use sqlx::{Executor, PgPool};

use pai_berbagi_api::config::{AppConfig, StorageConfig};
use pai_berbagi_api::database::DatabaseManager;
use pai_berbagi_api::server;
use pai_berbagi_api::state::AppState;
use pai_berbagi_api::storage::{StagedFile, UploadError, UploadFolder, UploadedAsset, Uploader};

const SCHEMA: &str = include_str!("../../sql/schema.sql");
const SCHEMA_LOCK: i64 = 7_242_011;

/// Stands in for the object store: answers with a predictable CDN URL
#[derive(Default)]
pub struct StubUploader {
    pub calls: Mutex<Vec<(String, UploadFolder)>>,
}

impl StubUploader {
    pub fn url_for(folder: UploadFolder, name: &str) -> String {
        format!("https://cdn.test/{}/{}", folder.name(), name)
    }
}

#[async_trait]
impl Uploader for StubUploader {
    async fn upload(&self, file: &StagedFile, folder: UploadFolder) -> Result<UploadedAsset, UploadError> {
        self.calls.lock().unwrap().push((file.original_name.clone(), folder));
        Ok(UploadedAsset {
            secure_url: Self::url_for(folder, &file.original_name),
            public_id: format!("{}/{}", folder.name(), file.original_name),
        })
    }
}

pub struct TestServer {
    pub base_url: String,
    pub pool: PgPool,
    pub uploader: Arc<StubUploader>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Serve the router on a free port against `DATABASE_URL`.
///
/// Every test using this is `#[ignore]`d; run them with
/// `DATABASE_URL=postgres://... cargo test -- --ignored`.
pub async fn start_server() -> Result<TestServer> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must point at a scratch Postgres database for integration tests")?;

    let storage = StorageConfig {
        cloud_name: "test".into(),
        api_key: "test".into(),
        api_secret: "test".into(),
        api_base: StorageConfig::DEFAULT_API_BASE.into(),
    };
    let mut config = AppConfig::development(database_url, storage);
    config.server.host = "127.0.0.1".into();
    config.server.port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.server.upload_dir = std::env::temp_dir().join("pai-berbagi-it-uploads");

    let db = DatabaseManager::connect(&config.database).await?;
    apply_schema(db.pool()).await?;

    let pool = db.pool().clone();
    let uploader = Arc::new(StubUploader::default());
    let addr = config.bind_address()?;
    let base_url = format!("http://{}", addr);
    let state = AppState::new(db, uploader.clone(), config);

    tokio::spawn(async move {
        if let Err(e) = server::serve(addr, state, std::future::pending()).await {
            eprintln!("test server failed: {}", e);
        }
    });

    let server = TestServer {
        base_url,
        pool,
        uploader,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

async fn apply_schema(pool: &PgPool) -> Result<()> {
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT pg_advisory_lock($1)").bind(SCHEMA_LOCK).execute(&mut *conn).await?;
    let applied = (&mut *conn).execute(SCHEMA).await;
    sqlx::query("SELECT pg_advisory_unlock($1)").bind(SCHEMA_LOCK).execute(&mut *conn).await?;
    applied.context("failed to apply sql/schema.sql")?;
    Ok(())
}

/// Unique suffix so concurrent tests never see each other's rows
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

pub async fn create_jenjang(server: &TestServer, name: &str) -> Result<serde_json::Value> {
    let form = reqwest::multipart::Form::new()
        .text("jenjang", name.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"\x89PNG fake".to_vec()).file_name(format!("{}.png", name)),
        );
    let res = server.client.post(server.url("/jenjang")).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED, "create jenjang failed");
    Ok(res.json().await?)
}

pub async fn create_link_modul(
    server: &TestServer,
    id_jenjang: i64,
    title: &str,
    link: &str,
) -> Result<serde_json::Value> {
    let form = reqwest::multipart::Form::new()
        .text("idJenjang", id_jenjang.to_string())
        .text("idKategori", "1")
        .text("title", title.to_string())
        .text("desc", format!("{} description", title))
        .text("name", format!("{} name", title))
        .text("link", link.to_string());
    let res = server.client.post(server.url("/modul")).multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED, "create modul failed");
    Ok(res.json().await?)
}
