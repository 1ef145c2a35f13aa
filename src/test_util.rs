//! Helpers for driving the full router against an in-memory database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, HeaderName, Method, Request, StatusCode,
    },
    Router,
};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use crate::{config::Config, db::memory_pool, route::create_router, AppState};

pub fn test_config() -> Config {
    Config::from_lookup(|name| {
        let value = match name {
            "ACCESS_TOKEN_SECRET" => "test-access-secret",
            "REFRESH_TOKEN_SECRET" => "test-refresh-secret",
            "PASSWORD_HASH_ITERATIONS" => "1000",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config")
}

pub async fn test_app() -> Router {
    test_app_with_pool().await.0
}

/// Like [`test_app`], but also hands back the pool so a test can change rows
/// underneath the router.
pub async fn test_app_with_pool() -> (Router, Pool<Sqlite>) {
    let db = memory_pool().await;
    let state = Arc::new(AppState::new(db.clone(), &test_config()));
    (create_router(state), db)
}

pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, String)>,
    body: Option<String>,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn header(mut self, header: (HeaderName, String)) -> Self {
        self.headers.push(header);
        self
    }

    pub fn json(self, body: Value) -> Self {
        self.raw_json(&body.to_string())
    }

    pub fn raw_json(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        match self.body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .expect("request")
    }
}

pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

pub fn cookie_header(name: &str, value: &str) -> (HeaderName, String) {
    (COOKIE, format!("{name}={value}"))
}

pub async fn send(app: &Router, request: TestRequest) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .clone()
        .oneshot(request.build())
        .await
        .expect("infallible router");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Registers `<name>` with email `<name>@x.com` and password `secret`.
pub async fn register(app: &Router, name: &str) -> Value {
    let (status, _, body) = send(
        app,
        TestRequest::post("/api/v1/users/register").json(json!({
            "fullName": format!("{name} tester"),
            "userName": name,
            "email": format!("{name}@x.com"),
            "password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
    body["data"].clone()
}

pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn login(app: &Router, name: &str) -> Tokens {
    let (status, _, body) = send(
        app,
        TestRequest::post("/api/v1/users/login")
            .json(json!({ "userName": name, "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {name}: {body}");
    Tokens {
        access_token: body["data"]["accessToken"]
            .as_str()
            .expect("access token")
            .to_string(),
        refresh_token: body["data"]["refreshToken"]
            .as_str()
            .expect("refresh token")
            .to_string(),
    }
}
