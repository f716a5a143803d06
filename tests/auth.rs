mod common;

use reqwest::{Client, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_pair_and_profile_fields() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "JohnDoe",
            "email": "john@example.com",
            "password": "Muzion15pass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");

    assert!(body["access"].as_str().is_some());
    assert!(body["refresh"].as_str().is_some());
    assert_eq!(body["username"].as_str(), Some("JohnDoe"));
    assert_eq!(body["email"].as_str(), Some("john@example.com"));
    assert!(body["user_id"].as_i64().is_some());
}

#[tokio::test]
async fn test_register_duplicate_username_is_rejected() {
    let base = common::spawn_app().await;
    let client = Client::new();

    common::register(&client, &base, "JaneDoe").await;

    let response = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "JaneDoe",
            "email": "other@example.com",
            "password": "Muzion15pass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["username"].as_str(), Some("Username already exists."));

    //the first account still works, no duplicate was created
    common::login(&client, &base, "JaneDoe@example.com", "Muzion15pass").await;

    let admin = common::admin_token(&client, &base).await;
    let users = client
        .get(format!("{base}/users"))
        .headers(common::bearer(&admin))
        .send()
        .await
        .expect("Failed to list users")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse users JSON");
    let count = users
        .as_array()
        .expect("Expected a users array")
        .iter()
        .filter(|user| user["username"].as_str() == Some("JaneDoe"))
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_register_weak_password_is_rejected() {
    let base = common::spawn_app().await;
    let client = Client::new();

    //too short
    let response = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "ShortPass",
            "email": "short@example.com",
            "password": "abc1"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //entirely numeric
    let response = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "NumericPass",
            "email": "numeric@example.com",
            "password": "1234567890"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_gives_no_detail() {
    let base = common::spawn_app().await;
    let client = Client::new();

    common::register(&client, &base, "Carol").await;

    let response = client
        .post(format!("{base}/login"))
        .json(&json!({
            "email": "Carol@example.com",
            "password": "WrongPass99x"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["detail"].as_str(), Some("Invalid credentials"));

    //same answer for an unknown account
    let response = client
        .post(format!("{base}/login"))
        .json(&json!({
            "email": "nobody@example.com",
            "password": "WrongPass99x"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_get_and_partial_update() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let token = common::register(&client, &base, "Dave").await;

    let response = client
        .get(format!("{base}/profile"))
        .headers(common::bearer(&token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["username"].as_str(), Some("Dave"));
    assert_eq!(body["isAdmin"].as_bool(), Some(false));
    assert!(body["token"].as_str().is_some());
    assert!(body.get("password").is_none());

    let response = client
        .put(format!("{base}/profile"))
        .headers(common::bearer(&token))
        .json(&json!({
            "first_name": "Dave",
            "last_name": "Grohl"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["first_name"].as_str(), Some("Dave"));
    assert_eq!(body["last_name"].as_str(), Some("Grohl"));
    //username untouched
    assert_eq!(body["username"].as_str(), Some("Dave"));
    //email untouched by the partial update
    assert_eq!(body["email"].as_str(), Some("Dave@example.com"));
}

#[tokio::test]
async fn test_profile_password_change_rehashes() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let token = common::register(&client, &base, "Erin").await;

    let response = client
        .put(format!("{base}/profile"))
        .headers(common::bearer(&token))
        .json(&json!({
            "password": "NewSecret16pass"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    //old password no longer works, new one does
    let response = client
        .post(format!("{base}/login"))
        .json(&json!({
            "email": "Erin@example.com",
            "password": "Muzion15pass"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    common::login(&client, &base, "Erin@example.com", "NewSecret16pass").await;
}

#[tokio::test]
async fn test_profile_requires_token() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{base}/profile"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{base}/profile"))
        .headers(common::bearer("not-a-jwt"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
