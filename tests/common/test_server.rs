use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use templo::config::ServerConfig;
use templo::server::{AppState, create_router};
use templo::setup::initialize_admin;
use templo::store::{SqliteStore, Store};

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    /// Serves the full router in-process on an ephemeral port.
    pub async fn start_with(config: ServerConfig) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..config
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");
        let (_, admin_token) = initialize_admin(&store, "keeper@templo.test").expect("init admin");

        let state = Arc::new(AppState::new(Arc::new(store), &config));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
            admin_token,
            client: reqwest::Client::new(),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the status code and parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.expect("send request");
        let status = resp.status().as_u16();
        let text = resp.text().await.expect("read body");
        let json = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        self.request(reqwest::Method::GET, path, token, None).await
    }

    pub async fn admin_post(&self, path: &str, body: Value) -> (u16, Value) {
        let token = self.admin_token.clone();
        self.request(reqwest::Method::POST, path, Some(&token), Some(body))
            .await
    }

    pub async fn admin_patch(&self, path: &str, body: Value) -> (u16, Value) {
        let token = self.admin_token.clone();
        self.request(reqwest::Method::PATCH, path, Some(&token), Some(body))
            .await
    }

    pub async fn admin_delete(&self, path: &str) -> u16 {
        let token = self.admin_token.clone();
        self.request(reqwest::Method::DELETE, path, Some(&token), None)
            .await
            .0
    }

    pub async fn put_progress(&self, token: &str, item_id: &str, percentage: f64) -> (u16, Value) {
        self.request(
            reqwest::Method::PUT,
            &format!("/api/v1/progress/{item_id}"),
            Some(token),
            Some(serde_json::json!({ "percentage": percentage })),
        )
        .await
    }

    /// Creates a reader with the given role and returns `(user_id, raw_token)`.
    pub async fn create_reader(&self, email: &str, role: &str) -> (String, String) {
        let (status, resp) = self
            .admin_post(
                "/api/v1/admin/users",
                serde_json::json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(status, 201, "create user: {resp}");
        let user_id = resp["data"]["id"].as_str().expect("user id").to_string();

        let (status, resp) = self
            .admin_post(
                &format!("/api/v1/admin/users/{user_id}/tokens"),
                serde_json::json!({}),
            )
            .await;
        assert_eq!(status, 201, "create token: {resp}");
        let token = resp["data"]["token"].as_str().expect("token").to_string();

        (user_id, token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
