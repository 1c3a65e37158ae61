use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use chef_vibes_api::config::AppConfig;
use chef_vibes_api::database::MemoryStore;
use chef_vibes_api::state::AppState;

pub const TEST_SECRET: &str = "integration-access-token-secret";

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve the full app on a fresh port, backed by an empty in-memory store
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        let mut config = AppConfig::development();
        config.server.port = port;
        config.security.token_secret = TEST_SECRET.to_string();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        tokio::spawn(chef_vibes_api::serve(listener, state, std::future::pending()));

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /jwt and return a `Cookie` header value carrying the token
    pub async fn login(&self, payload: Value) -> Result<String> {
        let res = self.client.post(self.url("/jwt")).json(&payload).send().await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "token request failed: {}", res.status());

        let body: Value = res.json().await?;
        let token = body["token"].as_str().context("token missing from response")?;
        Ok(format!("token={}", token))
    }
}
