#![allow(dead_code)] //not every suite uses every helper

use reqwest::{header, Client};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;

use rust_storefront::api::create_api_router;
use rust_storefront::entities::{primary_setup, setup_schema};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "AdminSecret15";

//Boots the app against a fresh in-memory database on an ephemeral port and
//returns its base url. One pooled connection: every sqlite `:memory:`
//connection is a distinct database.
pub async fn spawn_app() -> String {
    std::env::set_var("SECRET", "integration-test-secret");
    std::env::set_var("ADMIN_PASSWORD", ADMIN_PASSWORD);
    std::env::set_var(
        "UPLOAD_DIR",
        std::env::temp_dir().join("rust-storefront-test-uploads"),
    );

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory sqlite");
    setup_schema(&db).await;

    let shared_db = Arc::new(db);
    primary_setup(shared_db.clone()).await;

    let app = create_api_router(shared_db);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind an ephemeral port");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://{}", addr)
}

pub async fn login(client: &Client, base: &str, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{base}/login"))
        .json(&serde_json::json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login response JSON");
    body["access"]
        .as_str()
        .expect("Access token not found in login response")
        .to_owned()
}

pub async fn admin_token(client: &Client, base: &str) -> String {
    login(client, base, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

//Registers a user and returns their access token.
pub async fn register(client: &Client, base: &str, username: &str) -> String {
    let response = client
        .post(format!("{base}/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "Muzion15pass"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse register response JSON");
    body["access"]
        .as_str()
        .expect("Access token not found in register response")
        .to_owned()
}

pub fn bearer(token: &str) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("Failed to create Authorization header"),
    );
    headers
}

//Creates a product through the admin surface and returns its id.
pub async fn create_product(
    client: &Client,
    base: &str,
    token: &str,
    payload: serde_json::Value,
) -> i64 {
    let response = client
        .post(format!("{base}/create"))
        .headers(bearer(token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create product request");

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create product response JSON");
    body["id"].as_i64().expect("Product id missing")
}
