use serde::Deserialize;

use crate::error::AppError;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 50;

// Request bodies keep every field optional so a missing field surfaces as a
// 400 in the response envelope rather than a deserialization rejection.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchema {
    pub full_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSchema {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenSchema {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordSchema {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountSchema {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub user_name: Option<String>,
}

// Struct representing the request body for creating a new Todo
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoSchema {
    pub title: Option<String>,
    pub description: Option<String>,
}

// Struct representing the request body for updating a Todo
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoSchema {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(String),
    Username(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct LoginAttempt {
    pub identifier: LoginIdentifier,
    pub password: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn normalize_handle(value: &str) -> String {
    value.trim().to_lowercase()
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
        return Err(AppError::bad_request(format!(
            "Title must be between {TITLE_MIN_LEN} and {TITLE_MAX_LEN} characters long"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> Result<String, AppError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::bad_request("Description must not be blank"));
    }
    Ok(description.to_string())
}

impl RegisterSchema {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let (Some(full_name), Some(user_name), Some(email), Some(password)) = (
            present(self.full_name),
            present(self.user_name),
            present(self.email),
            present(self.password),
        ) else {
            return Err(AppError::bad_request("Please fill all the fields"));
        };

        Ok(NewUser {
            full_name: full_name.trim().to_string(),
            username: normalize_handle(&user_name),
            email: normalize_handle(&email),
            password,
        })
    }
}

impl LoginSchema {
    pub fn validate(self) -> Result<LoginAttempt, AppError> {
        let identifier = match (present(self.email), present(self.user_name)) {
            (Some(email), _) => LoginIdentifier::Email(normalize_handle(&email)),
            (None, Some(user_name)) => LoginIdentifier::Username(normalize_handle(&user_name)),
            (None, None) => return Err(AppError::bad_request("Email or username is required")),
        };
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::bad_request("Password is required"))?;

        Ok(LoginAttempt {
            identifier,
            password,
        })
    }
}

impl ChangePasswordSchema {
    pub fn validate(self) -> Result<PasswordChange, AppError> {
        match (self.old_password, present(self.new_password)) {
            (Some(old_password), Some(new_password)) if !old_password.is_empty() => {
                Ok(PasswordChange {
                    old_password,
                    new_password,
                })
            }
            _ => Err(AppError::bad_request(
                "Old password and new password are required",
            )),
        }
    }
}

impl UpdateAccountSchema {
    pub fn validate(self) -> Result<AccountChanges, AppError> {
        let fields = [&self.full_name, &self.email, &self.user_name];
        if fields.iter().all(|field| field.is_none()) {
            return Err(AppError::bad_request("Provide at least one field to update"));
        }
        if fields
            .iter()
            .any(|field| matches!(field, Some(value) if value.trim().is_empty()))
        {
            return Err(AppError::bad_request("Please fill all the fields"));
        }

        Ok(AccountChanges {
            full_name: self.full_name.map(|name| name.trim().to_string()),
            username: self.user_name.as_deref().map(normalize_handle),
            email: self.email.as_deref().map(normalize_handle),
        })
    }
}

impl CreateTodoSchema {
    pub fn validate(self) -> Result<NewTodo, AppError> {
        let (Some(title), Some(description)) = (self.title, self.description) else {
            return Err(AppError::bad_request("Title and description are required"));
        };

        Ok(NewTodo {
            title: validate_title(&title)?,
            description: validate_description(&description)?,
        })
    }
}

impl UpdateTodoSchema {
    pub fn validate(self) -> Result<TodoChanges, AppError> {
        if self.title.is_none() && self.description.is_none() {
            return Err(AppError::bad_request("Title or description is required"));
        }

        Ok(TodoChanges {
            title: self.title.as_deref().map(validate_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
        })
    }
}
