//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Once;

use sessiongate::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Seed accounts every test server starts with
pub const SEED_USERS: &[(&str, &str)] = &[("alice", "wonderland"), ("bob", "builder")];

/// The metrics registry is process-wide; register instruments once per test binary
static METRICS: Once = Once::new();

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        METRICS.call_once(sessiongate::metrics::init_metrics);

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
                request_timeout_seconds: 10,
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                session_max_age: 3600,
                purge_interval_seconds: 3600,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            users: SEED_USERS
                .iter()
                .map(|(username, password)| config::SeedUser {
                    username: username.to_string(),
                    password: password.to_string(),
                })
                .collect(),
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = sessiongate::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST /login with form credentials
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request succeeds")
    }

    /// Log in and return the session token
    pub async fn login_token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert!(
            response.status().is_redirection(),
            "login as {username} should redirect, got {}",
            response.status()
        );
        session_token(&response).expect("login sets sessionId cookie")
    }

    /// GET a path carrying the given session token
    pub async fn get_with_session(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Cookie", format!("sessionId={token}"))
            .send()
            .await
            .expect("request succeeds")
    }

    /// POST /logout carrying the given session token
    pub async fn logout(&self, token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/logout"))
            .header("Cookie", format!("sessionId={token}"))
            .send()
            .await
            .expect("logout request succeeds")
    }
}

/// All Set-Cookie header values on a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// Non-empty sessionId value set by a response
pub fn session_token(response: &reqwest::Response) -> Option<String> {
    set_cookies(response).iter().find_map(|header| {
        let pair = header.split(';').next()?.trim();
        let value = pair.strip_prefix("sessionId=")?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Location header of a redirect
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .expect("location header")
}
