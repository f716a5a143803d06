mod common;

use reqwest::{multipart, Client, StatusCode};
use serde_json::json;

const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01];

#[tokio::test]
async fn test_upload_image_attaches_file_to_product() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;

    let id = common::create_product(&client, &base, &admin, json!({ "name": "Poster" })).await;

    let form = multipart::Form::new().part(
        "image",
        multipart::Part::bytes(FAKE_PNG.to_vec()).file_name("poster.png"),
    );

    let response = client
        .post(format!("{base}/upload_image/{id}"))
        .headers(common::bearer(&admin))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse upload response JSON");

    let file_name = body["image"].as_str().expect("image field not set");
    assert!(file_name.ends_with(".png"));

    //the file is served back publicly
    let response = client
        .get(format!("{base}/image/{id}"))
        .send()
        .await
        .expect("Failed to fetch image");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("image/png")
    );
    let bytes = response.bytes().await.expect("Failed to read image bytes");
    assert_eq!(&bytes[..], FAKE_PNG);
}

#[tokio::test]
async fn test_upload_rejects_unknown_extension() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;

    let id = common::create_product(&client, &base, &admin, json!({ "name": "Doc" })).await;

    let form = multipart::Form::new().part(
        "image",
        multipart::Part::bytes(b"not an image".to_vec()).file_name("notes.txt"),
    );

    let response = client
        .post(format!("{base}/upload_image/{id}"))
        .headers(common::bearer(&admin))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_to_unknown_product_is_404() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let admin = common::admin_token(&client, &base).await;

    let form = multipart::Form::new().part(
        "image",
        multipart::Part::bytes(FAKE_PNG.to_vec()).file_name("poster.png"),
    );

    let response = client
        .post(format!("{base}/upload_image/4242"))
        .headers(common::bearer(&admin))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_is_admin_only() {
    let base = common::spawn_app().await;
    let client = Client::new();
    let token = common::register(&client, &base, "Uploader").await;

    let form = multipart::Form::new().part(
        "image",
        multipart::Part::bytes(FAKE_PNG.to_vec()).file_name("poster.png"),
    );

    let response = client
        .post(format!("{base}/upload_image/1"))
        .headers(common::bearer(&token))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
