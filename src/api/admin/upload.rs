use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tokio::fs as tokio_fs;
use uuid::Uuid;

use crate::api::public::product::ProductResponse;
use crate::api::public::uploads::upload_dir;
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn upload_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/upload_image/:id", post(upload_image))
        .layer(Extension(db))
}

//ROUTES
//Attaches a multipart `image` field to product `id`. The file lands under
//the upload dir as `{uuid}.{ext}`, the product row keeps the file name.
async fn upload_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    mut multipart: Multipart,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let model = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            let tmp = format!("No product with {id} id was found");
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "error": tmp
                    })),
                ),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            let tmp = "No file was attached";
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": tmp
                    })),
                ),
                Err(ApiError::General(tmp.to_string())),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Malformed multipart body"
                    })),
                ),
                Err(ApiError::General(format!("Multipart error: {err}"))),
            );
        }
    };

    if field.name() != Some("image") {
        let tmp = "Expected a multipart field named 'image'";
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": tmp
                })),
            ),
            Err(ApiError::General(tmp.to_string())),
        );
    }

    let file_extension = match field
        .file_name()
        .and_then(|name| name.rsplit('.').next())
        .map(|ext| ext.to_ascii_lowercase())
    {
        Some(ext) => match FileExtension::from_str(&ext) {
            Ok(ext) => ext,
            Err(_) => {
                let tmp = "Unsupported file extension. Only jpg and png are accepted.";
                return to_response(
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": tmp
                        })),
                    ),
                    Err(ApiError::ValidationFail(tmp.to_string())),
                );
            }
        },
        None => {
            let tmp = "File name is missing";
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": tmp
                    })),
                ),
                Err(ApiError::General(tmp.to_string())),
            );
        }
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to read file bytes."
                    })),
                ),
                Err(ApiError::General(format!("Multipart error: {err}"))),
            );
        }
    };

    if data.len() > get_file_size_limit() {
        let tmp = "Payload too large";
        return to_response(
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": tmp
                })),
            ),
            Err(ApiError::General(tmp.to_string())),
        );
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), file_extension.to_string());
    let dir = upload_dir();

    if let Err(err) = tokio_fs::create_dir_all(&dir).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to upload file to the server"
                })),
            ),
            Err(ApiError::General(err.to_string())),
        );
    }

    if let Err(err) = tokio_fs::write(format!("{}/{}", dir, file_name), &data).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to upload file to the server"
                })),
            ),
            Err(ApiError::General(err.to_string())),
        );
    }

    let mut model: product::ActiveModel = model.into();
    model.image = Set(Some(file_name));

    match model.update(&txn).await {
        Ok(updated) => match txn.commit().await {
            Ok(_) => to_response(
                (StatusCode::OK, Json(json!(ProductResponse::new(updated)))),
                Ok(()),
            ),
            Err(err) => to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            ),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            )
        }
    }
}

fn get_file_size_limit() -> usize {
    std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(5 * 1024 * 1024)
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FileExtension {
    JPG,
    PNG,
}

impl FromStr for FileExtension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" | "jpeg" => Ok(FileExtension::JPG),
            "png" => Ok(FileExtension::PNG),
            _ => Err(()),
        }
    }
}

impl ToString for FileExtension {
    fn to_string(&self) -> String {
        match self {
            FileExtension::JPG => "jpg".to_string(),
            FileExtension::PNG => "png".to_string(),
        }
    }
}
