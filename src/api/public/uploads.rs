use axum::routing::get;
use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::entities::product::Entity as ProductEntity;
use crate::middleware::logging::{to_response, ApiError};

pub fn uploads_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/image/:id", get(print_image))
        .layer(Extension(db))
}

pub(crate) fn upload_dir() -> String {
    std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_owned())
}

//Streams the stored image of product `id`.
pub async fn print_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let file_name = match ProductEntity::find_by_id(id).one(&*db).await {
        Ok(Some(model)) => match model.image {
            Some(file_name) => file_name,
            None => {
                let tmp = format!("Product with {id} id has no image");
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
        },
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

    let path = format!("{}/{}", upload_dir(), file_name);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "error": "Not found"
                    })),
                ),
                Err(ApiError::General(err.to_string())),
            )
        }
    };

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    to_response((StatusCode::OK, headers, body), Ok(()))
}
