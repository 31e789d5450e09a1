#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const JWT_SECRET: &str = "integration-test-secret";

// Records from tests/fixtures/seed.json
pub const OLIVIA_ID: &str = "0b7e6a52-3c1f-4d8e-9a51-6f2d9c0e1a01";
pub const OLIVIA_EMAIL: &str = "olivia@example.com";
pub const OLIVIA_PASSWORD: &str = "correct-horse";
pub const MARCO_ID: &str = "0b7e6a52-3c1f-4d8e-9a51-6f2d9c0e1a02";
pub const MARCO_EMAIL: &str = "marco@example.com";
pub const MARCO_PASSWORD: &str = "battery-staple";
pub const PINE_LODGE_ID: &str = "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e01";
pub const ALPENBLICK_ID: &str = "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e03";
pub const OLIVIA_BOOKING_IDS: [&str; 3] = [
    "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f02",
    "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f04",
    "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f01",
];
pub const MARCO_BOOKING_ID: &str = "2d3e4f5a-6b7c-4d8e-9f0a-1b2c3d4e5f03";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory backend seeded from the fixture, cheap bcrypt cost to keep startup fast
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_chalet-owner-api"));
        cmd.arg("serve")
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("STORE_SEED", concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/seed.json"))
            .env("JWT_SECRET", JWT_SECRET)
            .env("BCRYPT_COST", "4")
            .env_remove("CLOUDINARY_CLOUD_NAME")
            .env_remove("CLOUDINARY_API_KEY")
            .env_remove("CLOUDINARY_API_SECRET")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Log in through the API and return the bearer token.
pub async fn login(server: &TestServer, email: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/owner/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed with {}", res.status());

    let body: Value = res.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("login response carried no token")
}
