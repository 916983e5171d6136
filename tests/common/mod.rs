//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use leoconnect::config::{AppConfig, ClubSeed};
use leoconnect::http::HttpServer;
use leoconnect::lifecycle::Shutdown;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-test-secret";

/// A config suited to tests: fixed secret, cheap hashing, two seeded clubs.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.jwt_secret = Some(SECRET.into());
    config.auth.bcrypt_cost = 4;
    config.seed.clubs = vec![
        ClubSeed {
            id: "club-colombo".into(),
            name: "Leo Club of Colombo".into(),
            district: "306 A1".into(),
            description: None,
            avatar_url: None,
        },
        ClubSeed {
            id: "club-galle".into(),
            name: "Leo Club of Galle".into(),
            district: "306 A2".into(),
            description: None,
            avatar_url: None,
        },
    ];
    config
}

/// A running server. Shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.expect("server unreachable")).await
    }

    pub async fn send(
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
        read(req.send().await.expect("server unreachable")).await
    }

    /// Register and log in, returning the access token.
    pub async fn sign_up(&self, name: &str) -> String {
        let email = format!("{name}@example.com");
        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": name,
                    "email": email,
                    "password": "password123",
                    "leoDistrict": "306 A1",
                    "clubName": "Leo Club of Colombo",
                })),
            )
            .await;
        assert_eq!(status, 201, "{body}");

        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, 200, "{body}");
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn read(res: reqwest::Response) -> (u16, Value) {
    let status = res.status().as_u16();
    let text = res.text().await.unwrap();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, body)
}

/// Start the real server on an ephemeral port.
pub async fn spawn_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        client,
        shutdown,
    }
}
