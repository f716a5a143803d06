use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity};

//ROUTERS
pub fn admin_user_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/get_user/:id", get(get_user_by_id))
        .route("/delete_user/:id", delete(delete_user))
        .route("/admin_update_user/:id", put(update_user))
        .layer(Extension(db))
}

//ROUTES
async fn get_users(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
    match UserEntity::find()
        .order_by_asc(user::Column::Id)
        .all(&*db)
        .await
    {
        Ok(users) => {
            let response: Vec<AdminUserResponse> =
                users.into_iter().map(AdminUserResponse::new).collect();
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

async fn get_user_by_id(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    match UserEntity::find_by_id(id).one(&*db).await {
        Ok(Some(model)) => (StatusCode::OK, Json(json!(AdminUserResponse::new(model)))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "User not found"
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

async fn delete_user(
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

    match UserEntity::find_by_id(id).one(&txn).await {
        Ok(Some(entry)) => {
            let entry: user::ActiveModel = entry.into();
            match entry.delete(&txn).await {
                Ok(_) => {
                    let _ = txn.commit().await;
                    (
                        StatusCode::OK,
                        Json(json!({
                            "message": "User deleted"
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
                "error": "User not found"
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

async fn update_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateUserPayload>,
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

    match UserEntity::find_by_id(id).one(&txn).await {
        Ok(Some(model)) => {
            let mut model: user::ActiveModel = model.into();

            if let Some(first_name) = payload.first_name {
                model.first_name = Set(first_name);
            }

            if let Some(last_name) = payload.last_name {
                model.last_name = Set(last_name);
            }

            if let Some(email) = payload.email {
                model.email = Set(email);
            }

            if let Some(is_admin) = payload.is_admin {
                model.is_staff = Set(is_admin);
            }

            match model.update(&txn).await {
                Ok(updated) => match txn.commit().await {
                    Ok(_) => (StatusCode::OK, Json(json!(AdminUserResponse::new(updated)))),
                    Err(_) => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Email already exists"
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
                "error": "User not found"
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
#[derive(Deserialize, Clone, Debug, Validate)]
struct UpdateUserPayload {
    first_name: Option<String>,
    last_name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[serde(rename = "isAdmin")]
    is_admin: Option<bool>,
}

//no token field here: handing out another user's token would leak it
#[derive(Serialize)]
struct AdminUserResponse {
    id: i32,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

impl AdminUserResponse {
    fn new(value: user::Model) -> AdminUserResponse {
        AdminUserResponse {
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            is_admin: value.is_staff,
        }
    }
}
