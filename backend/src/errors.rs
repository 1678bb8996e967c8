use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use fhe_kyc::KycError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The relayer, SDK or chain failed while serving the request.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl From<KycError> for ApiError {
    fn from(e: KycError) -> Self {
        match e {
            KycError::WalletNotConnected
            | KycError::WrongNetwork { .. }
            | KycError::AgeRequirement { .. }
            | KycError::InvalidForm(_)
            | KycError::InvalidAddress(_)
            | KycError::LengthMismatch { .. }
            | KycError::ProviderNotFound
            | KycError::ContractNotDeployed => ApiError::BadRequest(e.to_string()),
            KycError::AlreadyVerified | KycError::TransportConflict { .. } => {
                ApiError::Conflict(e.to_string())
            }
            KycError::SdkLoad(_) | KycError::Sdk(_) | KycError::Timeout(_) | KycError::Transaction(_) => {
                ApiError::Upstream(e.to_string())
            }
            KycError::Config(_) | KycError::Deployment(_) => {
                tracing::error!(error = %e, "configuration failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
