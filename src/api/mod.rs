use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/users/{user_id}/stats", get(handlers::get_stats))
        .route(
            "/api/users/{user_id}/records",
            get(handlers::get_records).post(handlers::create_record),
        )
        .route("/api/records/{id}/leave", post(handlers::leave_record))
        .route("/api/records/{id}", delete(handlers::delete_record))
        .route("/api/slots/nearest", get(handlers::get_nearest_slot))
        .with_state(state)
}
