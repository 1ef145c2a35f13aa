use axum::{
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderName,
    },
    response::AppendHeaders,
};

use crate::token::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

pub type SetCookies = AppendHeaders<[(HeaderName, String); 2]>;

fn cookie(name: &str, value: &str, secure: bool, max_age: Option<u64>) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` headers carrying both session tokens.
pub fn session_cookies(tokens: &TokenPair, secure: bool) -> SetCookies {
    AppendHeaders([
        (
            SET_COOKIE,
            cookie(ACCESS_TOKEN_COOKIE, &tokens.access_token, secure, None),
        ),
        (
            SET_COOKIE,
            cookie(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, secure, None),
        ),
    ])
}

/// `Set-Cookie` headers expiring both session tokens.
pub fn clear_session_cookies(secure: bool) -> SetCookies {
    AppendHeaders([
        (SET_COOKIE, cookie(ACCESS_TOKEN_COOKIE, "", secure, Some(0))),
        (SET_COOKIE, cookie(REFRESH_TOKEN_COOKIE, "", secure, Some(0))),
    ])
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
