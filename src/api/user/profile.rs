use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::public::auth::hash_password;
use crate::entities::user::{self, Entity as UserEntity};
use crate::middleware::auth::{generate_access_token, Claims};

pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(put_profile))
        .layer(Extension(db))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match UserEntity::find_by_id(claims.user_id).one(&*db).await {
        Ok(Some(model)) => match ProfileResponse::new(model) {
            Ok(response) => (StatusCode::OK, Json(json!(response))),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            ),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Profile does not exist for the current user"
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

async fn put_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PutProfilePayload>,
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

    match UserEntity::find_by_id(claims.user_id).one(&txn).await {
        Ok(Some(model)) => {
            let mut model: user::ActiveModel = model.into();

            //username is immutable, everything else is partial
            if let Some(first_name) = payload.first_name {
                model.first_name = Set(first_name);
            }

            if let Some(last_name) = payload.last_name {
                model.last_name = Set(last_name);
            }

            if let Some(email) = payload.email {
                model.email = Set(email);
            }

            if let Some(password) = payload.password {
                if !password.is_empty() {
                    let password = match hash_password(&password) {
                        Ok(password) => password,
                        Err(_) => {
                            return (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                Json(json!({
                                    "error": "Internal server error"
                                })),
                            );
                        }
                    };
                    model.password = Set(password);
                }
            }

            let updated = match model.update(&txn).await {
                Ok(updated) => updated,
                Err(_) => {
                    let _ = txn.rollback().await;
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "error": "Email already exists"
                        })),
                    );
                }
            };

            match txn.commit().await {
                Ok(_) => match ProfileResponse::new(updated) {
                    Ok(response) => (StatusCode::OK, Json(json!(response))),
                    Err(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    ),
                },
                Err(_) => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Email already exists"
                    })),
                ),
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Profile does not exist for the current user"
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
struct PutProfilePayload {
    first_name: Option<String>,
    last_name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[validate(length(min = 8))]
    password: Option<String>,
}

#[derive(Serialize)]
struct ProfileResponse {
    id: i32,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
    token: String,
}

impl ProfileResponse {
    fn new(value: user::Model) -> Result<ProfileResponse, crate::middleware::auth::AuthMiddlewareError> {
        let token = generate_access_token(value.id, value.is_staff)?;
        Ok(ProfileResponse {
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            is_admin: value.is_staff,
            token,
        })
    }
}
