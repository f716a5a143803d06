use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::entities::user::{self, Entity as UserEntity};
use crate::middleware::auth::generate_token_pair;

static NUMERIC_ONLY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("Invalid password policy regex"));

//ROUTERS
pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .layer(Extension(db))
}

//ROUTES
async fn register_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterPayload>,
) -> impl IntoResponse {
    tracing::info!(username = %payload.username, "Called `register_user()`");

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

    //field-keyed duplicate errors, checked before the insert so the caller
    //learns which field collided
    match UserEntity::find()
        .filter(user::Column::Username.eq(&*payload.username))
        .one(&txn)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "username": "Username already exists."
                })),
            );
        }
        Ok(None) => {}
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    }

    match UserEntity::find()
        .filter(user::Column::Email.eq(&*payload.email))
        .one(&txn)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "email": "Email already exists."
                })),
            );
        }
        Ok(None) => {}
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    }

    let password = match hash_password(&payload.password) {
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

    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        email: Set(payload.email.clone()),
        password: Set(password),
        first_name: Set("".to_owned()),
        last_name: Set("".to_owned()),
        is_staff: Set(false),
        ..Default::default()
    };

    let user = match new_user.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            tracing::error!(error = %err, "Failed to insert user");
            let _ = txn.rollback().await;
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Username or email already exists"
                })),
            );
        }
    };

    if txn.commit().await.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        );
    }

    let tokens = match generate_token_pair(user.id, user.is_staff) {
        Ok(tokens) => tokens,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            );
        }
    };

    (
        StatusCode::CREATED,
        Json(json!(RegisterResponse {
            refresh: tokens.refresh,
            access: tokens.access,
            username: user.username,
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        })),
    )
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginPayload>,
) -> impl IntoResponse {
    //the storefront client submits the email through the username credential
    //slot, so match on either column
    let result = UserEntity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&*payload.email))
                .add(user::Column::Username.eq(&*payload.email)),
        )
        .one(&*db)
        .await;

    match result {
        Ok(Some(model)) => match model.check_hash(&payload.password) {
            Ok(()) => match generate_token_pair(model.id, model.is_staff) {
                Ok(tokens) => (
                    StatusCode::OK,
                    Json(json!({
                        "refresh": tokens.refresh,
                        "access": tokens.access
                    })),
                ),
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
            },
            Err(_) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": "Invalid credentials"
                })),
            ),
        },
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "detail": "Invalid credentials"
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

//utilities
pub(crate) fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if NUMERIC_ONLY_REGEX.is_match(password) {
        return Err(ValidationError::new("password_entirely_numeric"));
    }
    Ok(())
}

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct RegisterPayload {
    #[validate(length(min = 1, max = 150))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(
        length(min = 8),
        custom(function = validate_password_strength)
    )]
    password: String,
}

#[derive(Deserialize, Clone, Debug)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    refresh: String,
    access: String,
    username: String,
    user_id: i32,
    first_name: String,
    last_name: String,
    email: String,
}
