//! Integration tests for the onboarding REST API.
//!
//! Each test spins up an Axum server on a random port backed by a fresh
//! database and drives it over HTTP with reqwest.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use onboarding_wizard::onboarding::{OnboardingManager, OnboardingRouteState, onboarding_routes};
use onboarding_wizard::store::{Database, LibSqlBackend};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start an Axum server on a random port over the given database, return its base URL.
async fn start_server_with(db: Arc<dyn Database>) -> String {
    let manager = Arc::new(OnboardingManager::new(db, 4));
    let app = onboarding_routes(OnboardingRouteState { manager });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

async fn start_server() -> String {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    start_server_with(db).await
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn get(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn full_onboarding_flow() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/start"),
            json!({"email": "grace@example.com", "password": "hopper42"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["session"]["user_id"].as_str().unwrap().to_string();

        // Blank about_me is rejected and the user stays on page 2.
        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({"step": 2, "about_me": "   "}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["about_me"], "Please tell us about yourself");

        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({"step": 2, "about_me": "Compiler enthusiast"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["step"], 3);

        // Incomplete address.
        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({"step": 3, "address": {"street_address": "1 Navy Way", "city": "Arlington"}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["address"], "Please fill in all address fields");

        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({
                "step": 3,
                "address": {
                    "street_address": "1 Navy Way",
                    "city": "Arlington",
                    "state": "VA",
                    "zip": "22202"
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["step"], 4);
        assert_eq!(body["session"]["completed"], true);
        assert_eq!(body["notice"]["title"], "Welcome!");

        let (status, users) = get(&client, format!("{base}/api/users")).await;
        assert_eq!(status, StatusCode::OK);
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["email"], "grace@example.com");
        assert_eq!(users[0]["zip"], "22202");
        assert!(users[0].get("password_hash").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn resume_restores_progress() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let (_, body) = post(
            &client,
            format!("{base}/api/onboarding/start"),
            json!({"email": "linus@example.com", "password": "kernel99"}),
        )
        .await;
        let id = body["session"]["user_id"].as_str().unwrap().to_string();
        post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({"step": 2, "about_me": "Penguins"}),
        )
        .await;

        let (status, body) = get(
            &client,
            format!("{base}/api/onboarding/resume?email=linus@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["step"], 3);
        assert_eq!(body["session"]["form"]["about_me"], "Penguins");
        assert_eq!(body["notice"]["title"], "Welcome back!");

        let (status, _) = get(
            &client,
            format!("{base}/api/onboarding/resume?email=nobody@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Going back returns to page 2 with the stored answer intact.
        let (status, body) = post(&client, format!("{base}/api/onboarding/{id}/back"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["step"], 2);
        assert_eq!(body["session"]["form"]["about_me"], "Penguins");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn admin_changes_drive_the_wizard() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server().await;
        let client = reqwest::Client::new();

        let (status, body) = get(&client, format!("{base}/api/onboarding/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"2": ["about_me"], "3": ["address"]}));

        let (status, body) = post(
            &client,
            format!("{base}/api/admin/config/add"),
            json!({"component": "birthdate", "page": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"]["title"], "Configuration saved");

        let (status, body) = post(
            &client,
            format!("{base}/api/admin/config/move"),
            json!({"component": "address", "from": 3, "to": 2}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["layout"], json!({"2": ["about_me", "address"], "3": ["birthdate"]}));

        let (status, body) = get(&client, format!("{base}/api/onboarding/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"2": ["about_me", "address"], "3": ["birthdate"]}));

        // Page 3 now only asks for a birth date.
        let (_, body) = post(
            &client,
            format!("{base}/api/onboarding/start"),
            json!({"email": "ada@example.com", "password": "engine1"}),
        )
        .await;
        let id = body["session"]["user_id"].as_str().unwrap().to_string();
        let (status, body) = post(
            &client,
            format!("{base}/api/onboarding/{id}/step"),
            json!({"step": 2, "about_me": "Notes"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"].get("address").is_some());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn layout_survives_restart() {
    timeout(TEST_TIMEOUT, async {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onboarding.db");
        let client = reqwest::Client::new();

        {
            let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&path).await.unwrap());
            let base = start_server_with(db).await;
            let resp = client
                .put(format!("{base}/api/admin/config"))
                .json(&json!({"2": ["birthdate"], "3": ["address", "about_me"]}))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&path).await.unwrap());
        let base = start_server_with(db).await;
        let (_, body) = get(&client, format!("{base}/api/onboarding/config")).await;
        assert_eq!(body, json!({"2": ["birthdate"], "3": ["address", "about_me"]}));
    })
    .await
    .expect("test timed out");
}
