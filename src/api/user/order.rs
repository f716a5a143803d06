use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::entities::{
    order::{self, Entity as OrderEntity},
    order_item::{self, Entity as OrderItemEntity},
    product::{self, Entity as ProductEntity},
    shipping_address::{self, Entity as ShippingAddressEntity},
    user::{self, Entity as UserEntity},
};
use crate::middleware::auth::Claims;

//ROUTERS
pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/add_order_items", post(add_order_items))
        .route("/order/:id", get(get_order_by_id))
        .route("/update_order_topaid/:id", put(update_order_to_paid))
        .route("/my_orders", get(get_my_orders))
        .layer(Extension(db))
}

//ROUTES
async fn add_order_items(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PlaceOrderPayload>,
) -> impl IntoResponse {
    tracing::info!(user_id = claims.user_id, "Called `add_order_items()`");

    let items = match payload.order_items {
        Some(items) if !items.is_empty() => items,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "No order items provided."
                })),
            )
                .into_response();
        }
    };

    if items.iter().any(|item| item.quantity <= 0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Quantity should be greater than 0"
            })),
        )
            .into_response();
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
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

    //resolve every referenced product up front; any miss fails the whole
    //request before anything is persisted
    let mut total_price: f32 = 0.0;
    let mut resolved: Vec<(product::Model, i32)> = Vec::with_capacity(items.len());

    for item in &items {
        match ProductEntity::find_by_id(item.product).one(&txn).await {
            Ok(Some(product)) => {
                total_price += product.price * item.quantity as f32;
                resolved.push((product, item.quantity));
            }
            Ok(None) => {
                let _ = txn.rollback().await;
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": format!("Product with ID {} does not exist.", item.product)
                    })),
                )
                    .into_response();
            }
            Err(_) => {
                let _ = txn.rollback().await;
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

    let new_order = order::ActiveModel {
        user_id: Set(claims.user_id),
        payment_method: Set(payload.payment_method),
        tax_price: Set(payload.tax_price.unwrap_or(0.0)),
        shipping_price: Set(payload.shipping_price.unwrap_or(0.0)),
        total_price: Set(total_price),
        is_paid: Set(false),
        paid_at: Set(None),
        is_delivered: Set(false),
        delivered_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let order = match new_order.insert(&txn).await {
        Ok(model) => model,
        Err(_) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
                .into_response();
        }
    };

    if let Some(address) = payload.shipping_address {
        let new_address = shipping_address::ActiveModel {
            order_id: Set(order.id),
            address: Set(address.address),
            city: Set(address.city),
            postal_code: Set(address.postal_code),
            country: Set(address.country),
            ..Default::default()
        };
        if ShippingAddressEntity::insert(new_address)
            .exec(&txn)
            .await
            .is_err()
        {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
                .into_response();
        }
    }

    for (product, quantity) in &resolved {
        let new_item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            quantity: Set(*quantity),
            //unit price snapshot
            price: Set(product.price),
            ..Default::default()
        };
        if OrderItemEntity::insert(new_item).exec(&txn).await.is_err() {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            )
                .into_response();
        }

        //conditional decrement: the stock guard and the subtraction are one
        //statement, so two racing orders cannot both overdraw
        let decrement = ProductEntity::update_many()
            .col_expr(
                product::Column::CountInStock,
                Expr::col(product::Column::CountInStock).sub(*quantity),
            )
            .filter(product::Column::Id.eq(product.id))
            .filter(product::Column::CountInStock.gte(*quantity))
            .exec(&txn)
            .await;

        match decrement {
            Ok(result) if result.rows_affected == 0 => {
                let _ = txn.rollback().await;
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": format!("Not enough stock for product with ID {}.", product.id)
                    })),
                )
                    .into_response();
            }
            Ok(_) => {}
            Err(_) => {
                let _ = txn.rollback().await;
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

    if txn.commit().await.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        )
            .into_response();
    }

    match build_order_response(&*db, order).await {
        Ok(response) => (StatusCode::CREATED, Json(json!(response))).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        )
            .into_response(),
    }
}

async fn get_order_by_id(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let order = match OrderEntity::find_by_id(id).one(&*db).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Order not found."
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

    if order.user_id != claims.user_id && !claims.is_staff {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Permission denied."
            })),
        )
            .into_response();
    }

    match build_order_response(&*db, order).await {
        Ok(response) => (StatusCode::OK, Json(json!(response))).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        )
            .into_response(),
    }
}

async fn update_order_to_paid(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
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
            if order.user_id != claims.user_id && !claims.is_staff {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": "Permission denied."
                    })),
                );
            }

            let mut order: order::ActiveModel = order.into();
            order.is_paid = Set(true);
            order.paid_at = Set(Some(Utc::now()));

            match order.update(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => (
                        StatusCode::OK,
                        Json(json!({
                            "message": "Order updated to paid."
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

async fn get_my_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .filter(order::Column::UserId.eq(claims.user_id))
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

//Assembles the nested order representation: user, line items, shipping
//address. Shared with the admin order surface.
pub(crate) async fn build_order_response<C: ConnectionTrait>(
    conn: &C,
    order: order::Model,
) -> Result<OrderResponse, DbErr> {
    let user_data = match UserEntity::find_by_id(order.user_id).one(conn).await? {
        Some(user) => json!(OrderUserData::new(user)),
        None => json!({}),
    };

    let order_items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItemResponse::new)
        .collect();

    let shipping_address = match ShippingAddressEntity::find()
        .filter(shipping_address::Column::OrderId.eq(order.id))
        .one(conn)
        .await?
    {
        Some(address) => json!(ShippingAddressResponse::new(address)),
        None => json!({}),
    };

    Ok(OrderResponse {
        id: order.id,
        user_data,
        order_items,
        shipping_address,
        payment_method: order.payment_method,
        tax_price: order.tax_price,
        shipping_price: order.shipping_price,
        total_price: order.total_price,
        is_paid: order.is_paid,
        paid_at: order.paid_at,
        is_delivered: order.is_delivered,
        delivered_at: order.delivered_at,
        created_at: order.created_at,
    })
}

//structs
#[derive(Deserialize, Clone, Debug)]
struct PlaceOrderPayload {
    order_items: Option<Vec<OrderItemPayload>>,
    payment_method: Option<String>,
    tax_price: Option<f32>,
    shipping_price: Option<f32>,
    shipping_address: Option<ShippingAddressPayload>,
}

#[derive(Deserialize, Clone, Debug)]
struct OrderItemPayload {
    product: i32,
    quantity: i32,
}

#[derive(Deserialize, Clone, Debug)]
struct ShippingAddressPayload {
    address: String,
    city: String,
    postal_code: String,
    country: String,
}

#[derive(Serialize)]
pub(crate) struct OrderResponse {
    pub id: i32,
    pub user_data: serde_json::Value,
    pub order_items: Vec<OrderItemResponse>,
    pub shipping_address: serde_json::Value,
    pub payment_method: Option<String>,
    pub tax_price: f32,
    pub shipping_price: f32,
    pub total_price: f32,
    pub is_paid: bool,
    pub paid_at: Option<chrono::DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<chrono::DateTime<Utc>>,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
pub(crate) struct OrderItemResponse {
    product: Option<i32>,
    quantity: i32,
    price: f32,
}

impl OrderItemResponse {
    fn new(value: order_item::Model) -> OrderItemResponse {
        OrderItemResponse {
            product: value.product_id,
            quantity: value.quantity,
            price: value.price,
        }
    }
}

#[derive(Serialize)]
struct OrderUserData {
    id: i32,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

impl OrderUserData {
    fn new(value: user::Model) -> OrderUserData {
        OrderUserData {
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            is_admin: value.is_staff,
        }
    }
}

#[derive(Serialize)]
struct ShippingAddressResponse {
    id: i32,
    order: i32,
    address: String,
    city: String,
    postal_code: String,
    country: String,
}

impl ShippingAddressResponse {
    fn new(value: shipping_address::Model) -> ShippingAddressResponse {
        ShippingAddressResponse {
            id: value.id,
            order: value.order_id,
            address: value.address,
            city: value.city,
            postal_code: value.postal_code,
            country: value.country,
        }
    }
}
