use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::user::order::build_order_response;
use crate::entities::order::{self, Entity as OrderEntity};

//ROUTERS
pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_all_orders))
        .route("/update_order_todelivered/:id", put(update_order_to_delivered))
        .layer(Extension(db))
}

//ROUTES
async fn get_all_orders(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .order_by_asc(order::Column::Id)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
                .into_response();
        }
    };

    let mut response = Vec::with_capacity(orders.len());
    for order in orders {
        match build_order_response(&*db, order).await {
            Ok(value) => response.push(value),
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                )
                    .into_response();
            }
        }
    }

    (StatusCode::OK, Json(response)).into_response()
}

async fn update_order_to_delivered(
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

    match OrderEntity::find_by_id(id).one(&txn).await {
        Ok(Some(order)) => {
            let mut order: order::ActiveModel = order.into();
            order.is_delivered = Set(true);
            order.delivered_at = Set(Some(Utc::now()));

            match order.update(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Order updated to delivered."
                        })),
                    ),
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
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    )
                }
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Order not found."
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
