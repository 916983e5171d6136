//! End-to-end authentication flow against a live server.

use reqwest::Method;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_register_login_profile() {
    let server = common::spawn_server(common::test_config()).await;
    let token = server.sign_up("tharindu").await;

    let (status, body) = server.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["username"], json!("tharindu"));
    assert_eq!(body["user"]["email"], json!("tharindu@example.com"));
}

#[tokio::test]
async fn test_gated_routes_reject_missing_and_bogus_tokens() {
    let server = common::spawn_server(common::test_config()).await;

    for path in ["/api/auth/profile", "/api/posts", "/api/clubs", "/api/events"] {
        let (status, body) = server.get(path, None).await;
        assert_eq!(status, 401, "{path}");
        assert_eq!(body, json!({ "message": "Access denied. No token provided." }));

        let (status, body) = server.get(path, Some("invalidtoken")).await;
        assert_eq!(status, 401, "{path}");
        assert_eq!(body, json!({ "message": "Invalid token" }));
    }
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let server = common::spawn_server(common::test_config()).await;
    let forged = leoconnect::security::token::TokenKeys::new("other-secret", "leoconnect", 60)
        .issue("someone")
        .unwrap();

    let (status, _) = server.get("/api/auth/profile", Some(&forged)).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_missing_secret_fails_closed() {
    let mut config = common::test_config();
    config.auth.jwt_secret = None;
    let server = common::spawn_server(config).await;

    let (status, body) = server
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "nosecret",
                "email": "nosecret@example.com",
                "password": "password123",
                "leoDistrict": "306 A1",
                "clubName": "Leo Club of Colombo",
            })),
        )
        .await;
    assert_eq!(status, 201, "{body}");

    let (status, body) = server
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nosecret@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "message": "Internal server error" }));

    let (status, body) = server.get("/api/auth/profile", Some("anything")).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "message": "Internal server error" }));
}

#[tokio::test]
async fn test_concurrent_users_see_only_their_own_profile() {
    let server = common::spawn_server(common::test_config()).await;
    let names = ["asha", "bimal", "chamari", "dinesh", "eranga"];

    let mut tokens = Vec::new();
    for name in names {
        tokens.push((name, server.sign_up(name).await));
    }

    let server = std::sync::Arc::new(server);
    let mut tasks = Vec::new();
    for (name, token) in tokens {
        let server = server.clone();
        tasks.push(tokio::spawn(async move {
            let (status, body) = server.get("/api/auth/profile", Some(&token)).await;
            (name, status, body)
        }));
    }

    for task in tasks {
        let (name, status, body) = task.await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["user"]["username"], json!(name));
    }
}
