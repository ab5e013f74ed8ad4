use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response (always 200 OK)
    pub fn success(data: T) -> Self {
        Self { data }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::OK
    }

    /// Erase the payload type so every handler yields the same result type.
    pub fn into_value(self) -> Result<ApiResponse<Value>, ApiError> {
        let data = serde_json::to_value(&self.data).map_err(|e| {
            tracing::error!("Failed to serialize response data: {}", e);
            ApiError::internal_server_error(e.to_string())
        })?;
        Ok(ApiResponse { data })
    }
}

impl ApiResponse<Value> {
    /// Success envelope: `{status: "success", data}`
    pub fn to_json(&self) -> Value {
        json!({
            "status": "success",
            "data": self.data,
        })
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self.into_value() {
            Ok(res) => (res.status(), Json(res.to_json())).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_payload_keeps_data_key() {
        let res = ApiResponse::success(()).into_value().unwrap();
        assert_eq!(res.to_json(), json!({"status": "success", "data": null}));
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn list_payload_is_wrapped() {
        let res = ApiResponse::success(vec!["a", "b"]).into_value().unwrap();
        assert_eq!(res.to_json(), json!({"status": "success", "data": ["a", "b"]}));
    }
}
