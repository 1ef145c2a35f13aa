use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    cookie::{self, REFRESH_TOKEN_COOKIE},
    error::AppError,
    model::{CurrentUser, User},
    response::ApiResponse,
    schema::{
        ChangePasswordSchema, LoginSchema, RefreshTokenSchema, RegisterSchema,
        UpdateAccountSchema,
    },
    store::user::{self as user_store, NewUserRecord, DUPLICATE_USER},
    token::{TokenKind, TokenPair},
    AppState,
};

const STALE_REFRESH_TOKEN: &str = "Refresh token is expired or used";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

// PBKDF2 blocks for a while; run it off the async workers
async fn hash_password(data: &AppState, password: String) -> Result<String, AppError> {
    let hasher = data.passwords.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
}

async fn verify_password(
    data: &AppState,
    password: String,
    stored: String,
) -> Result<bool, AppError> {
    let hasher = data.passwords.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
}

pub async fn register(
    State(data): State<Arc<AppState>>,
    body: Result<Json<RegisterSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let new_user = body.validate()?;

    if user_store::exists_with_handle(&data.db, &new_user.username, &new_user.email).await? {
        return Err(AppError::conflict(DUPLICATE_USER));
    }

    let password_hash = hash_password(&data, new_user.password).await?;

    // The unique constraints still catch a registration racing this one
    let user = user_store::insert(
        &data.db,
        NewUserRecord {
            full_name: &new_user.full_name,
            username: &new_user.username,
            email: &new_user.email,
            password_hash: &password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::created(user, "User registered successfully"))
}

pub async fn login(
    State(data): State<Arc<AppState>>,
    body: Result<Json<LoginSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let attempt = body.validate()?;

    let credentials = user_store::find_credentials(&data.db, &attempt.identifier)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&data, attempt.password, credentials.password).await? {
        tracing::info!(user_id = credentials.id, "login rejected: wrong password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let tokens = data.tokens.issue_pair(credentials.id)?;
    user_store::set_refresh_token(&data.db, credentials.id, Some(&tokens.refresh_token)).await?;

    let user = user_store::find_by_id(&data.db, credentials.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = user.id, "user logged in");
    let cookies = cookie::session_cookies(&tokens, data.cookie_secure);
    let TokenPair {
        access_token,
        refresh_token,
    } = tokens;

    Ok((
        cookies,
        ApiResponse::ok(
            LoginData {
                user,
                access_token,
                refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// Clears the stored refresh token and both cookies. Access tokens already
/// handed out stay valid until they expire.
pub async fn logout(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    user_store::set_refresh_token(&data.db, current_user.id(), None).await?;

    tracing::info!(user_id = current_user.id(), "user logged out");
    Ok((
        cookie::clear_session_cookies(data.cookie_secure),
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

/// Exchanges a refresh token for a new token pair. The stored token is
/// swapped only if it still matches the presented one, so a token can be
/// redeemed at most once.
pub async fn refresh_access_token(
    State(data): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenSchema>>,
) -> Result<impl IntoResponse, AppError> {
    let incoming = cookie::read_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|Json(body)| body.refresh_token))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

    let user_id = data.tokens.verify(&incoming, TokenKind::Refresh)?.user_id()?;

    let credentials = user_store::find_credentials_by_id(&data.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if credentials.refresh_token.as_deref() != Some(incoming.as_str()) {
        tracing::warn!(user_id = credentials.id, "stale refresh token presented");
        return Err(AppError::unauthorized(STALE_REFRESH_TOKEN));
    }

    let tokens = data.tokens.issue_pair(credentials.id)?;
    let rotated = user_store::rotate_refresh_token(
        &data.db,
        credentials.id,
        &incoming,
        &tokens.refresh_token,
    )
    .await?;
    if !rotated {
        tracing::warn!(user_id = credentials.id, "refresh token rotated concurrently");
        return Err(AppError::unauthorized(STALE_REFRESH_TOKEN));
    }

    Ok((
        cookie::session_cookies(&tokens, data.cookie_secure),
        ApiResponse::ok(tokens, "Access token refreshed successfully"),
    ))
}

pub async fn change_password(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<ChangePasswordSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let change = body.validate()?;

    let credentials = user_store::find_credentials_by_id(&data.db, current_user.id())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&data, change.old_password, credentials.password).await? {
        return Err(AppError::unauthorized("Invalid old password"));
    }

    let password_hash = hash_password(&data, change.new_password).await?;
    user_store::update_password(&data.db, current_user.id(), &password_hash).await?;

    tracing::info!(user_id = current_user.id(), "password changed");
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn update_account_details(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<UpdateAccountSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let changes = body.validate()?;

    let user = user_store::update_profile(&data.db, current_user.id(), &changes)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

pub async fn get_current_user(
    Extension(current_user): Extension<CurrentUser>,
) -> impl IntoResponse {
    ApiResponse::ok(current_user.user, "Current user fetched successfully")
}
