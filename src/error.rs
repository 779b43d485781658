use crate::entities::OrderStatus;
use crate::models::ApiResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No cart item selected")]
    NoCartSelected,

    #[error("Product {0} is not available for purchase")]
    InvalidProduct(i64),

    #[error("Insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: i64, required: i64 },

    #[error("Requested amount exceeds stock of product {0}")]
    StockExceeded(i64),

    #[error("Bill {0} is already paid")]
    BillAlreadyPaid(i64),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Checkout failures after which the unpaid bill is discarded.
    pub fn voids_bill(&self) -> bool {
        matches!(
            self,
            AppError::InsufficientPoints { .. }
                | AppError::StockExceeded(_)
                | AppError::InvalidProduct(_)
        )
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::NoCartSelected => {
                (StatusCode::BAD_REQUEST, "NO_CART_SELECTED", self.to_string())
            }
            AppError::InvalidProduct(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_PRODUCT", self.to_string())
            }
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone()),
            AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTH_ERROR",
                "Invalid token".to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string()),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Permission denied".to_string(),
            ),
            AppError::InsufficientPoints { .. } => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_POINTS",
                self.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::NotAcceptable(msg) => {
                (StatusCode::NOT_ACCEPTABLE, "NOT_ACCEPTABLE", msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::BillAlreadyPaid(_) => {
                (StatusCode::CONFLICT, "BILL_ALREADY_PAID", self.to_string())
            }
            AppError::StockExceeded(_) => {
                (StatusCode::CONFLICT, "STOCK_EXCEEDED", self.to_string())
            }
            AppError::InvalidTransition { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STATUS_TRANSITION",
                self.to_string(),
            ),
            AppError::ExternalApiError(msg) => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR", msg.clone())
            }
            AppError::ReqwestError(_) => (
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_API_ERROR",
                "Payment gateway unreachable".to_string(),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();

        if status_code.is_server_error() {
            log::error!("{error_code}: {self}");
        } else {
            log::warn!("{error_code}: {self}");
        }

        HttpResponse::build(status_code).json(ApiResponse::failure(error_code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_state_errors_map_to_distinct_codes() {
        let insufficient = AppError::InsufficientPoints {
            balance: 10,
            required: 20,
        };
        assert_eq!(insufficient.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(insufficient.parts().1, "INSUFFICIENT_POINTS");

        assert_eq!(AppError::StockExceeded(1).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::StockExceeded(1).parts().1, "STOCK_EXCEEDED");
        assert_eq!(AppError::BillAlreadyPaid(1).parts().1, "BILL_ALREADY_PAID");
        assert_eq!(
            AppError::NoCartSelected.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = AppError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Confirmed,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let msg = err.to_string();
        assert!(msg.contains("shipped"));
        assert!(msg.contains("confirmed"));
    }

    #[test]
    fn test_voids_bill_only_for_checkout_failures() {
        assert!(AppError::StockExceeded(3).voids_bill());
        assert!(AppError::InvalidProduct(3).voids_bill());
        assert!(
            AppError::InsufficientPoints {
                balance: 0,
                required: 1
            }
            .voids_bill()
        );
        assert!(!AppError::NoCartSelected.voids_bill());
        assert!(!AppError::BillAlreadyPaid(1).voids_bill());
    }
}
