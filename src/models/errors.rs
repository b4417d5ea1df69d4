use rust_decimal::Decimal;
use thiserror::Error;

use super::OrderStatus;

/// Errors produced by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("storage I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },
}

/// Errors surfaced by repositories, the session resolver and checkout.
///
/// None of these are retried anywhere in this crate; retry policy belongs
/// to the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("credential rejected: {reason}")]
    CredentialRejected { reason: String },

    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("not found")]
    NotFound,

    #[error("invalid order total: expected {expected}, got {actual}")]
    InvalidOrderTotal { expected: Decimal, actual: Decimal },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("cart is empty")]
    EmptyCart,

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            other => ServiceError::BackendUnavailable {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for persistence backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for repository and service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let error = ServiceError::InvalidOrderTotal {
            expected: dec!(130),
            actual: dec!(129),
        };
        assert_eq!(error.to_string(), "invalid order total: expected 130, got 129");

        let error = ServiceError::InvalidStatusTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Completed,
        };
        assert_eq!(
            error.to_string(),
            "invalid status transition: pending -> completed"
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let err: ServiceError = StoreError::NotFound.into();
        assert!(matches!(err, ServiceError::NotFound));

        let err: ServiceError = StoreError::Unavailable {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_store_error_from_serde() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json");
        assert!(json_error.is_err());

        let store_error: StoreError = json_error.unwrap_err().into();
        assert!(matches!(store_error, StoreError::Serialization { .. }));
    }
}
