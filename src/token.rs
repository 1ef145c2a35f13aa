use std::time::Duration;

use base64::{engine::general_purpose, Engine};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::{config::TokenConfig, error::AppError};

const JTI_LEN: usize = 16;
const LEEWAY_SECS: u64 = 5;

/// Payload carried by both access and refresh tokens. `sub` holds the user id
/// as a string, the only form the registered claim is checked in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject"))
    }
}

/// Which secret a token is signed and verified with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn from_config(config: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: config.expiry,
        }
    }
}

/// Issues and verifies HS256 tokens. Access and refresh tokens use separate
/// secrets and lifetimes, so one can never be accepted in place of the other.
///
/// Issuing a token persists nothing; storing the refresh token is up to the caller.
#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
    rng: SystemRandom,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(access: &TokenConfig, refresh: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = LEEWAY_SECS;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: SigningKeys::from_config(access),
            refresh: SigningKeys::from_config(refresh),
            validation,
            rng: SystemRandom::new(),
        }
    }

    pub fn issue_access_token(&self, user_id: i64) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, AppError> {
        self.issue(user_id, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Checks the signature and expiry of `token` against the secret for `kind`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)?;
        Ok(data.claims)
    }

    fn issue(&self, user_id: i64, kind: TokenKind) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(keys.ttl.as_secs())
            .map_err(|_| AppError::internal("Token lifetime is out of range"))?;
        let claims = Claims {
            sub: user_id.to_string(),
            jti: self.token_id()?,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn token_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; JTI_LEN];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::internal("Failed to generate token id"))?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }
}
