use crate::entities::user::Entity as UserEntity;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use dotenvy::dotenv;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let db = state.db;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => match header.strip_prefix("Bearer ") {
            Some(token) => token,
            _ => return Err(StatusCode::UNAUTHORIZED),
        },
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let claims = match validate_token(db, token, state.staff_only).await {
        Ok(claims) => claims,
        Err(AuthMiddlewareError::InsufficientRole) => return Err(StatusCode::FORBIDDEN),
        Err(AuthMiddlewareError::InternalServerError) => {
            return Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub is_staff: bool,
    pub token_type: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub staff_only: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

//Access/refresh pair, the same shape the storefront client already expects.
pub fn generate_token_pair(user_id: i32, is_staff: bool) -> Result<TokenPair, AuthMiddlewareError> {
    Ok(TokenPair {
        access: generate_token(user_id, is_staff, "access", Duration::hours(24))?,
        refresh: generate_token(user_id, is_staff, "refresh", Duration::days(7))?,
    })
}

pub fn generate_access_token(user_id: i32, is_staff: bool) -> Result<String, AuthMiddlewareError> {
    generate_token(user_id, is_staff, "access", Duration::hours(24))
}

fn generate_token(
    user_id: i32,
    is_staff: bool,
    token_type: &str,
    lifetime: Duration,
) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(lifetime)
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        user_id,
        is_staff,
        token_type: token_type.to_owned(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_secret_key().as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

pub async fn validate_token(
    db: Arc<DatabaseConnection>,
    token: &str,
    staff_only: bool,
) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::TokenExpired)?;

    let claims = token_data.claims;

    //only the access half of the pair opens endpoints
    if claims.token_type != "access" {
        return Err(AuthMiddlewareError::ValidationFail);
    }

    match UserEntity::find_by_id(claims.user_id).one(&*db).await {
        Ok(Some(user)) => {
            if staff_only && !user.is_staff {
                return Err(AuthMiddlewareError::InsufficientRole);
            }
            //the staff flag may have changed since the token was issued
            Ok(Claims {
                is_staff: user.is_staff,
                ..claims
            })
        }
        Ok(None) => Err(AuthMiddlewareError::InvalidUser),
        Err(_) => Err(AuthMiddlewareError::InternalServerError),
    }
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Invalid user id")]
    InvalidUser,
    #[error("Staff role required")]
    InsufficientRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}

fn get_secret_key() -> String {
    dotenv().ok();
    std::env::var("SECRET").expect("SECRET not found in .env file")
}
