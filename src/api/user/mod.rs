pub mod order;
pub mod profile;
pub mod review;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::auth::{auth_middleware, AuthState};
use order::order_router;
use profile::profile_router;
use review::review_router;

pub fn user_api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(profile_router(db.clone()))
        .merge(review_router(db.clone()))
        .merge(order_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                staff_only: false,
            },
            auth_middleware,
        ))
}
