use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::public::product::ReviewResponse;
use crate::entities::{product, review, user};
use crate::middleware::auth::Claims;

pub fn review_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/create_review/:id", post(create_review))
        .layer(Extension(db))
}

async fn create_review(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReviewPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!(errors)));
    }

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

    match product::Entity::find_by_id(id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found.", id)
                })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    }

    let reviewer_name = match user::Entity::find_by_id(claims.user_id).one(&txn).await {
        Ok(Some(user)) => user.username,
        Ok(None) | Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    let new_review = review::ActiveModel {
        product_id: Set(id),
        user_id: Set(claims.user_id),
        name: Set(reviewer_name),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let review = match new_review.insert(&txn).await {
        Ok(model) => model,
        Err(_) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    //cached counter, bumped in the same transaction as the insert
    let bump = product::Entity::update_many()
        .col_expr(
            product::Column::NumReviews,
            Expr::col(product::Column::NumReviews).add(1),
        )
        .filter(product::Column::Id.eq(id))
        .exec(&txn)
        .await;

    if bump.is_err() {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        );
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!(ReviewResponse::new(review))),
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
#[derive(Deserialize, Clone, Debug, Validate)]
struct CreateReviewPayload {
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    comment: String,
}
