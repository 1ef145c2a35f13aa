use axum::response::IntoResponse;
use serde_json::json;

use crate::response::ApiResponse;

pub mod todo;
pub mod user;

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Todo and account API with Rust, SQLX, SQLite, and Axum";

    ApiResponse::ok(json!({ "status": "healthy" }), MESSAGE)
}

pub async fn users_welcome_handler() -> impl IntoResponse {
    ApiResponse::ok(json!({}), "Welcome to the users API")
}

pub async fn todos_welcome_handler() -> impl IntoResponse {
    ApiResponse::ok(json!({}), "Welcome to the todos API")
}
