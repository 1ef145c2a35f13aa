use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::AppError,
    model::{User, UserCredentials},
    schema::{AccountChanges, LoginIdentifier},
};

pub const DUPLICATE_USER: &str = "User with that email or username already exists";

pub struct NewUserRecord<'a> {
    pub full_name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

pub async fn find_by_id(db: &Pool<Sqlite>, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, full_name, username, email, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn exists_with_handle(
    db: &Pool<Sqlite>,
    username: &str,
    email: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ? OR email = ?")
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

/// Inserts a user; a username or email collision is reported as `Conflict`.
pub async fn insert(db: &Pool<Sqlite>, record: NewUserRecord<'_>) -> Result<User, AppError> {
    let now = Utc::now();
    sqlx::query_as::<_, User>(
        "INSERT INTO users (full_name, username, email, password, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING id, full_name, username, email, created_at, updated_at",
    )
    .bind(record.full_name)
    .bind(record.username)
    .bind(record.email)
    .bind(record.password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .map_err(AppError::on_duplicate(DUPLICATE_USER))
}

pub async fn find_credentials(
    db: &Pool<Sqlite>,
    identifier: &LoginIdentifier,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    let (sql, value) = match identifier {
        LoginIdentifier::Email(email) => (
            "SELECT id, password, refresh_token FROM users WHERE email = ?",
            email.as_str(),
        ),
        LoginIdentifier::Username(username) => (
            "SELECT id, password, refresh_token FROM users WHERE username = ?",
            username.as_str(),
        ),
    };

    sqlx::query_as::<_, UserCredentials>(sql)
        .bind(value)
        .fetch_optional(db)
        .await
}

pub async fn find_credentials_by_id(
    db: &Pool<Sqlite>,
    id: i64,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        "SELECT id, password, refresh_token FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Overwrites the stored refresh token; `None` clears it.
pub async fn set_refresh_token(
    db: &Pool<Sqlite>,
    id: i64,
    token: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
        .bind(token)
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Swaps `current` for `next` only if `current` is still the stored token.
/// Returns `false` when another request rotated or cleared it first.
pub async fn rotate_refresh_token(
    db: &Pool<Sqlite>,
    id: i64,
    current: &str,
    next: &str,
) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query(
        "UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ? AND refresh_token = ?",
    )
    .bind(next)
    .bind(Utc::now())
    .bind(id)
    .bind(current)
    .execute(db)
    .await?
    .rows_affected();
    Ok(rows_affected == 1)
}

pub async fn update_password(
    db: &Pool<Sqlite>,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_profile(
    db: &Pool<Sqlite>,
    id: i64,
    changes: &AccountChanges,
) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET \
            full_name = COALESCE(?, full_name), \
            username = COALESCE(?, username), \
            email = COALESCE(?, email), \
            updated_at = ? \
         WHERE id = ? \
         RETURNING id, full_name, username, email, created_at, updated_at",
    )
    .bind(changes.full_name.as_deref())
    .bind(changes.username.as_deref())
    .bind(changes.email.as_deref())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(AppError::on_duplicate(DUPLICATE_USER))
}
