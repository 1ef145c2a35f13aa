use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// Envelope every endpoint answers with, success or failure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    status_code: u16,
    data: T,
    message: String,
    success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status,
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_in_camel_case() {
        let response = ApiResponse::created(json!({ "id": 1 }), "Todo created successfully");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({
                "statusCode": 201,
                "data": { "id": 1 },
                "message": "Todo created successfully",
                "success": true
            })
        );
    }

    #[test]
    fn failure_status_is_not_success() {
        let response = ApiResponse::new(StatusCode::NOT_FOUND, json!(null), "Todo not found");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["statusCode"], json!(404));
        assert!(value["data"].is_null());
    }
}
