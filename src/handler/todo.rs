use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    model::CurrentUser,
    response::ApiResponse,
    schema::{CreateTodoSchema, UpdateTodoSchema},
    store::todo as todo_store,
    AppState,
};

fn todo_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Todo with ID: {id} not found"))
}

// Handler for getting all Todo items of the caller
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let todos = todo_store::list(&data.db, current_user.id()).await?;

    Ok(ApiResponse::ok(todos, "Todos retrieved successfully"))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let new_todo = body.validate()?;

    let todo = todo_store::insert(&data.db, current_user.id(), &new_todo).await?;

    tracing::debug!(todo_id = todo.id, owner = todo.owner, "todo created");
    Ok(ApiResponse::created(todo, "Todo created successfully"))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    path: Result<Path<i64>, PathRejection>,
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    let todo = todo_store::find(&data.db, current_user.id(), id)
        .await?
        .ok_or_else(|| todo_not_found(id))?;

    Ok(ApiResponse::ok(todo, "Todo retrieved successfully"))
}

// Handler for updating a Todo by ID
pub async fn update_todo(
    path: Result<Path<i64>, PathRejection>,
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let changes = body.validate()?;

    let todo = todo_store::update(&data.db, current_user.id(), id, &changes)
        .await?
        .ok_or_else(|| todo_not_found(id))?;

    Ok(ApiResponse::ok(todo, "Todo updated successfully"))
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    path: Result<Path<i64>, PathRejection>,
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    let todo = todo_store::delete(&data.db, current_user.id(), id)
        .await?
        .ok_or_else(|| todo_not_found(id))?;

    Ok(ApiResponse::ok(todo, "Todo deleted successfully"))
}
