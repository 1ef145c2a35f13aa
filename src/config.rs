use std::{env, num::NonZeroU32, time::Duration};

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_ACCESS_TOKEN_EXPIRY: &str = "15m";
const DEFAULT_REFRESH_TOKEN_EXPIRY: &str = "10d";
const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 100_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expiry: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub access_token: TokenConfig,
    pub refresh_token: TokenConfig,
    pub cookie_secure: bool,
    pub password_hash_iterations: NonZeroU32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "COOKIE_SECURE",
                value,
                reason: "expected true or false",
            })?,
            None => true,
        };

        let password_hash_iterations = match get("PASSWORD_HASH_ITERATIONS") {
            Some(value) => value
                .trim()
                .parse::<NonZeroU32>()
                .map_err(|_| ConfigError::Invalid {
                    name: "PASSWORD_HASH_ITERATIONS",
                    value,
                    reason: "expected a positive integer",
                })?,
            None => NonZeroU32::new(DEFAULT_PASSWORD_HASH_ITERATIONS)
                .ok_or(ConfigError::Missing("PASSWORD_HASH_ITERATIONS"))?,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            access_token: token_config(
                &get,
                "ACCESS_TOKEN_SECRET",
                "ACCESS_TOKEN_EXPIRY",
                DEFAULT_ACCESS_TOKEN_EXPIRY,
            )?,
            refresh_token: token_config(
                &get,
                "REFRESH_TOKEN_SECRET",
                "REFRESH_TOKEN_EXPIRY",
                DEFAULT_REFRESH_TOKEN_EXPIRY,
            )?,
            cookie_secure,
            password_hash_iterations,
        })
    }
}

fn token_config<G>(
    get: &G,
    secret_var: &'static str,
    expiry_var: &'static str,
    default_expiry: &str,
) -> Result<TokenConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secret = get(secret_var).ok_or(ConfigError::Missing(secret_var))?;
    let raw_expiry = get(expiry_var).unwrap_or_else(|| default_expiry.to_string());
    let expiry = parse_expiry(&raw_expiry).ok_or(ConfigError::Invalid {
        name: expiry_var,
        value: raw_expiry.clone(),
        reason: "expected a duration like 900, 15m, 12h or 10d",
    })?;

    Ok(TokenConfig { secret, expiry })
}

/// Parses `<n>` (seconds) or `<n>s`, `<n>m`, `<n>h`, `<n>d`. Zero is rejected.
pub fn parse_expiry(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let amount: u64 = digits.trim().parse().ok()?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return None,
    };

    match amount.checked_mul(multiplier)? {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
