use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get},
    Router,
};
use crate::handlers::product::{handle_products, inventory_summary, API_BODY_LIMIT};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api",
            any(handle_products).layer(DefaultBodyLimit::max(API_BODY_LIMIT)),
        )
        .route("/api/summary", get(inventory_summary))
}
