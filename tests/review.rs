mod common;

use reqwest::{Client, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_create_review_bumps_counter_and_shows_in_detail() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;

    let id = common::create_product(
        &client,
        &base,
        &admin,
        json!({
            "name": "Kettle",
            "price": 30.0,
            "countInStock": 5
        }),
    )
    .await;

    let token = common::register(&client, &base, "Reviewer").await;

    let response = client
        .post(format!("{base}/create_review/{id}"))
        .headers(common::bearer(&token))
        .json(&json!({
            "rating": 4,
            "comment": "Boils fast."
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["rating"].as_i64(), Some(4));
    assert_eq!(body["name"].as_str(), Some("Reviewer"));

    let response = client
        .get(format!("{base}/product/{id}"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");

    assert_eq!(body["num_reviews"].as_i64(), Some(1));
    let reviews = body["reviews"].as_array().expect("Expected a reviews array");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["comment"].as_str(), Some("Boils fast."));
    assert_eq!(reviews[0]["rating"].as_i64(), Some(4));
}

#[tokio::test]
async fn test_second_review_by_same_user_is_allowed() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;

    let id = common::create_product(&client, &base, &admin, json!({ "name": "Mug" })).await;
    let token = common::register(&client, &base, "Repeater").await;

    for comment in ["First take.", "Second take."] {
        let response = client
            .post(format!("{base}/create_review/{id}"))
            .headers(common::bearer(&token))
            .json(&json!({
                "rating": 5,
                "comment": comment
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = client
        .get(format!("{base}/product/{id}"))
        .send()
        .await
        .expect("Failed to send request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["num_reviews"].as_i64(), Some(2));
    assert_eq!(body["reviews"].as_array().map(|r| r.len()), Some(2));
}

#[tokio::test]
async fn test_review_on_unknown_product_is_404() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let token = common::register(&client, &base, "Lost").await;

    let response = client
        .post(format!("{base}/create_review/4242"))
        .headers(common::bearer(&token))
        .json(&json!({
            "rating": 3,
            "comment": "Where is it?"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_requires_authentication() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;
    let id = common::create_product(&client, &base, &admin, json!({ "name": "Plate" })).await;

    let response = client
        .post(format!("{base}/create_review/{id}"))
        .json(&json!({
            "rating": 2,
            "comment": "Anonymous."
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
