use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::public::product::ProductResponse;
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::auth::Claims;

//ROUTERS
pub fn admin_product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/create", post(create_product))
        .route("/update_product/:id", put(update_product))
        .route("/delete_product/:id", delete(delete_product))
        .layer(Extension(db))
}

//ROUTES
async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProductPayload>,
) -> impl IntoResponse {
    tracing::info!(user_id = claims.user_id, "Called `create_product()`");

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    //omitted fields get fixed placeholder values instead of failing
    //validation; the storefront admin fills them in later
    let new_product = product::ActiveModel {
        user_id: Set(claims.user_id),
        name: Set(payload.name.unwrap_or_else(|| "Default Name".to_owned())),
        price: Set(payload.price.unwrap_or(0.0)),
        brand: Set(payload.brand.unwrap_or_else(|| "Default Brand".to_owned())),
        category: Set(payload
            .category
            .unwrap_or_else(|| "Default Category".to_owned())),
        description: Set(payload
            .description
            .unwrap_or_else(|| "Default Description".to_owned())),
        image: Set(None),
        count_in_stock: Set(payload.count_in_stock.unwrap_or(0)),
        num_reviews: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_product.insert(&txn).await {
        Ok(model) => match txn.commit().await {
            Ok(_) => (
                StatusCode::CREATED,
                Json(json!(ProductResponse::new(model))),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            ),
        },
        Err(err) => {
            tracing::error!(error = %err, "Failed to insert product");
            let _ = txn.rollback().await;
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Failed to create this resource"
                })),
            )
        }
    }
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateProductPayload>,
) -> impl IntoResponse {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            let mut model: product::ActiveModel = model.into();

            if let Some(name) = payload.name {
                model.name = Set(name);
            }

            if let Some(price) = payload.price {
                model.price = Set(price);
            }

            if let Some(brand) = payload.brand {
                model.brand = Set(brand);
            }

            if let Some(category) = payload.category {
                model.category = Set(category);
            }

            if let Some(description) = payload.description {
                model.description = Set(description);
            }

            if let Some(count_in_stock) = payload.count_in_stock {
                model.count_in_stock = Set(count_in_stock);
            }

            match model.update(&txn).await {
                Ok(updated) => match txn.commit().await {
                    Ok(_) => (StatusCode::OK, Json(json!(ProductResponse::new(updated)))),
                    Err(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    ),
                },
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to patch this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Product not found"
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
    }
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            let model: product::ActiveModel = model.into();
            match model.delete(&txn).await {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Product deleted"
                        })),
                    )
                }
                Err(_) => {
                    let _ = txn.rollback().await;
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Failed to delete this resource"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Product not found"
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
    }
}

//structs
#[derive(Deserialize, Clone, Debug)]
struct CreateProductPayload {
    name: Option<String>,
    price: Option<f32>,
    brand: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(rename = "countInStock")]
    count_in_stock: Option<i32>,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateProductPayload {
    name: Option<String>,
    price: Option<f32>,
    brand: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(rename = "countInStock")]
    count_in_stock: Option<i32>,
}
