use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 所有 REST 接口共用的响应外壳
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// 机器可读的错误码，如 `INSUFFICIENT_POINTS`
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_omits_data() {
        let body = serde_json::to_value(ApiResponse::failure("NOT_FOUND", "Room 3".into())).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "error": {"code": "NOT_FOUND", "message": "Room 3"}})
        );
    }

    #[test]
    fn test_success_omits_error() {
        let body = serde_json::to_value(ApiResponse::success(json!({"balance": 5}))).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"balance": 5}}));
    }
}
