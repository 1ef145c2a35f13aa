use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        health_checker_handler, todo::*, todos_welcome_handler, user::*, users_welcome_handler,
    },
    middleware::mw_require_auth,
    AppState,
};

const BODY_LIMIT: usize = 16 * 1024;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let users = Router::new()
        .route("/logout", post(logout))
        .route("/changePassword", post(change_password))
        .route("/updateAccountDetails", put(update_account_details))
        .route("/currentUser", get(get_current_user))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/", get(users_welcome_handler))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refreshAccessToken", post(refresh_access_token));

    let todos = Router::new()
        .route("/create", post(create_todo))
        .route("/getAllTodos", get(get_todos))
        .route("/getTodoById/:id", get(get_todo))
        .route("/updateTodoById/:id", put(update_todo))
        .route("/deleteTodoById/:id", delete(delete_todo))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/", get(todos_welcome_handler));

    Router::new()
        .route("/", get(health_checker_handler))
        .nest("/api/v1/users", users)
        .nest("/api/v1/todos", todos)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_util::{send, test_app, TestRequest};

    #[tokio::test]
    async fn health_check_is_public() {
        let app = test_app().await;
        let (status, _, body) = send(&app, TestRequest::get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn welcome_routes_are_public() {
        let app = test_app().await;

        for uri in ["/api/v1/users", "/api/v1/todos"] {
            let (status, _, body) = send(&app, TestRequest::get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["success"], true);
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = test_app().await;
        let padding = "x".repeat(32 * 1024);
        let (status, _, _) = send(
            &app,
            TestRequest::post("/api/v1/users/register")
                .json(serde_json::json!({ "fullName": padding })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
