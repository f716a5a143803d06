use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    product::{self, Entity as ProductEntity},
    review::{self, Entity as ReviewEntity},
};

pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/product/:id", get(get_product))
        .layer(Extension(db))
}

async fn get_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let result = ProductEntity::find()
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await;
    match result {
        Ok(products) => {
            let response: Vec<ProductResponse> =
                products.into_iter().map(ProductResponse::new).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        )
            .into_response(),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let result = ProductEntity::find_by_id(id).one(&*db).await;
    let product = match result {
        Ok(Some(product)) => product,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found.", id)
                })),
            )
                .into_response();
        }
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

    let reviews = match ReviewEntity::find()
        .filter(review::Column::ProductId.eq(product.id))
        .order_by_asc(review::Column::Id)
        .all(&*db)
        .await
    {
        Ok(reviews) => reviews,
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

    (
        StatusCode::OK,
        Json(ProductDetailResponse::new(product, reviews)),
    )
        .into_response()
}

//Structs
#[derive(Serialize)]
pub(crate) struct ProductResponse {
    pub id: i32,
    pub user: i32,
    pub name: String,
    pub price: f32,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(rename = "countInStock")]
    pub count_in_stock: i32,
    pub num_reviews: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProductResponse {
    pub(crate) fn new(value: product::Model) -> ProductResponse {
        ProductResponse {
            id: value.id,
            user: value.user_id,
            name: value.name,
            price: value.price,
            brand: value.brand,
            category: value.category,
            description: value.description,
            image: value.image,
            count_in_stock: value.count_in_stock,
            num_reviews: value.num_reviews,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize)]
struct ProductDetailResponse {
    #[serde(flatten)]
    product: ProductResponse,
    reviews: Vec<ReviewResponse>,
}

impl ProductDetailResponse {
    fn new(product: product::Model, reviews: Vec<review::Model>) -> ProductDetailResponse {
        ProductDetailResponse {
            product: ProductResponse::new(product),
            reviews: reviews.into_iter().map(ReviewResponse::new).collect(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ReviewResponse {
    pub id: i32,
    pub product: i32,
    pub user: i32,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ReviewResponse {
    pub(crate) fn new(value: review::Model) -> ReviewResponse {
        ReviewResponse {
            id: value.id,
            product: value.product_id,
            user: value.user_id,
            name: value.name,
            rating: value.rating,
            comment: value.comment,
            created_at: value.created_at,
        }
    }
}
