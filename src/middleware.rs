use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    cookie::{self, ACCESS_TOKEN_COOKIE},
    error::AppError,
    model::CurrentUser,
    store::user as user_store,
    token::TokenKind,
    AppState,
};

/// Resolves the access token (cookie first, then bearer header) into a
/// [`CurrentUser`] extension for downstream handlers.
pub async fn mw_require_auth<B>(
    State(data): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let token = cookie::read_cookie(request.headers(), ACCESS_TOKEN_COOKIE)
        .or_else(|| cookie::bearer_token(request.headers()))
        .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

    let user_id = data.tokens.verify(&token, TokenKind::Access)?.user_id()?;

    let user = user_store::find_by_id(&data.db, user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id, "token refers to a missing user");
            AppError::not_found("User not found")
        })?;

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}
