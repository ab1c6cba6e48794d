#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

pub const ROOT_EMAIL: &str = "root@pressroom.test";
pub const ROOT_PASSWORD: &str = "R00t-password";
pub const PASSWORD: &str = "Passw0rd!";

static SERVER: OnceLock<TestServer> = OnceLock::new();

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

        // Empty DATABASE_URL selects the in-memory store and keeps a stray .env from overriding it
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pressroom-api"));
        cmd.env("APP_ENV", "development")
            .env("PRESSROOM_HOST", "127.0.0.1")
            .env("PRESSROOM_PORT", port.to_string())
            .env("DATABASE_URL", "")
            .env("JWT_SECRET", "pressroom-integration-secret")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("API_ENABLE_REQUEST_LOGGING", "false")
            .env("SEED_SUPER_ADMIN_USERNAME", "root")
            .env("SEED_SUPER_ADMIN_EMAIL", ROOT_EMAIL)
            .env("SEED_SUPER_ADMIN_PASSWORD", ROOT_PASSWORD)
            .env("RUST_LOG", "pressroom=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// A unique suffix so tests sharing the server never collide.
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}

/// Thin JSON client over the spawned server.
pub struct Api {
    pub base_url: String,
    http: reqwest::Client,
}

impl Api {
    pub async fn connect() -> Result<Self> {
        let server = ensure_server().await?;
        Ok(Self {
            base_url: server.base_url.clone(),
            http: reqwest::Client::new(),
        })
    }

    pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .send(Method::POST, "/api/auth/login", None, Some(json!({"email": email, "password": password})))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"].as_str().map(str::to_string).context("token missing")
    }

    pub async fn root_token(&self) -> Result<String> {
        self.login(ROOT_EMAIL, ROOT_PASSWORD).await
    }

    /// Sign up a fresh account; returns `(token, user id, email)`.
    pub async fn signup(&self, prefix: &str) -> Result<(String, String, String)> {
        let name = unique(prefix);
        let email = format!("{}@pressroom.test", name);
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({"username": name, "email": email, "password": PASSWORD})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);
        let token = body["data"]["token"].as_str().context("token missing")?.to_string();
        let id = body["data"]["user"]["id"].as_str().context("id missing")?.to_string();
        Ok((token, id, email))
    }

    /// Create a role as the super-admin; returns its id.
    pub async fn create_role(&self, root: &str, prefix: &str, permissions: &[&str]) -> Result<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/roles",
                Some(root),
                Some(json!({"name": unique(prefix), "permissions": permissions})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "role create failed: {} {}", status, body);
        body["data"]["id"].as_str().map(str::to_string).context("role id missing")
    }

    pub async fn set_permissions(&self, root: &str, role_id: &str, permissions: &[&str]) -> Result<()> {
        let (status, body) = self
            .send(
                Method::PUT,
                &format!("/api/roles/{}", role_id),
                Some(root),
                Some(json!({"permissions": permissions})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "role update failed: {} {}", status, body);
        Ok(())
    }

    pub async fn assign_role(&self, root: &str, user_id: &str, role_id: &str) -> Result<()> {
        let (status, body) = self
            .send(
                Method::PUT,
                &format!("/api/users/{}", user_id),
                Some(root),
                Some(json!({"role": role_id})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "role assignment failed: {} {}", status, body);
        Ok(())
    }

    /// A signed-up user moved into a fresh role with `permissions`.
    /// Returns `(token, user id, role id)`.
    pub async fn user_with(&self, root: &str, permissions: &[&str]) -> Result<(String, String, String)> {
        let role_id = self.create_role(root, "role", permissions).await?;
        let (token, user_id, _) = self.signup("user").await?;
        self.assign_role(root, &user_id, &role_id).await?;
        Ok((token, user_id, role_id))
    }
}
