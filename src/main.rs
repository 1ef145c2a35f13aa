use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Server,
};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use std::{net::SocketAddr, sync::Arc};

mod config;
mod cookie;
mod db;
mod error;
mod handler;
mod middleware;
mod model;
mod password;
mod response;
mod route;
mod schema;
mod store;
mod token;

#[cfg(test)]
mod test_util;

use config::Config;
use password::PasswordHasher;
use route::create_router;
use token::TokenService;

// Struct representing the application state
pub struct AppState {
    db: Pool<Sqlite>,
    tokens: TokenService,
    passwords: PasswordHasher,
    cookie_secure: bool,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: &Config) -> Self {
        Self {
            db,
            tokens: TokenService::new(&config.access_token, &config.refresh_token),
            passwords: PasswordHasher::new(config.password_hash_iterations),
            cookie_secure: config.cookie_secure,
        }
    }
}

// Entry point of the application
#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Connect to the database, creating it and its tables if needed
    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let origin = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(err) => {
            tracing::error!(%err, origin = %config.cors_origin, "invalid CORS origin");
            std::process::exit(1);
        }
    };

    // Configure CORS settings for the application
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let app_state = Arc::new(AppState::new(pool, &config));
    let app = create_router(app_state).layer(cors);

    let addr = match format!("{}:{}", config.host, config.port).parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(%err, host = %config.host, "invalid listen address");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "🚀 Server started successfully");

    if let Err(err) = Server::bind(&addr).serve(app.into_make_service()).await {
        tracing::error!(%err, "server error");
        std::process::exit(1);
    }
}
