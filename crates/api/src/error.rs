//! API error type and transport-code mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use paygate_types::Error;
use serde::Serialize;

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    InternalError(String),
}

/// Domain rejections map to transport codes here; the engine itself only
/// knows reason kinds.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::DuplicateTransaction(_) => ApiError::Conflict(err.to_string()),
            Error::PaymentNotFound(_)
            | Error::PaymentAlreadyCompleted(_)
            | Error::PaymentCancelled(_)
            | Error::UnsupportedCurrency(_)
            | Error::StoreNotFound => ApiError::BadRequest(err.to_string()),
            Error::FeeOracleUnavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            Error::Notification(_) | Error::Storage(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorBody {
            error: self.to_string(),
        }))
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_types::{Currency, PaymentId, TxHash};

    #[test]
    fn test_domain_error_mapping() {
        assert!(matches!(
            ApiError::from(Error::DuplicateTransaction(TxHash::from("abc"))),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(Error::PaymentCancelled(PaymentId(1))),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(Error::UnsupportedCurrency(Currency::Ethereum)),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(Error::FeeOracleUnavailable("timeout".to_string())),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(Error::Storage("down".to_string())),
            ApiError::InternalError(_)
        ));
    }
}
