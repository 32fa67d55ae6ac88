//! APIエラーとHTTPステータスの対応

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::DefectError;

/// エラーレスポンス本文
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{detail}")]
    Internal { code: &'static str, detail: String },
}

impl ApiError {
    /// 内部エラーには `context` を前置する
    pub fn from_defect(err: DefectError, context: &str) -> Self {
        let code = match &err {
            DefectError::InvalidInput(msg) => return ApiError::BadRequest(msg.clone()),
            DefectError::NotFound(msg) => return ApiError::NotFound(msg.clone()),
            DefectError::MissingApiKey | DefectError::Config(_) => "CONFIGURATION_ERROR",
            DefectError::CredentialRevoked => "CREDENTIAL_REVOKED",
            DefectError::Upstream { .. } => "UPSTREAM_ERROR",
            DefectError::UpstreamUnreachable(_) => "UPSTREAM_UNREACHABLE",
            _ => {
                return ApiError::Internal {
                    code: "INTERNAL",
                    detail: format!("{}: {}", context, err),
                }
            }
        };
        ApiError::Internal {
            code,
            detail: err.to_string(),
        }
    }
}

impl From<DefectError> for ApiError {
    fn from(err: DefectError) -> Self {
        ApiError::from_defect(err, "Request failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::PayloadTooLarge(detail) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", detail)
            }
            ApiError::Internal { code, detail } => {
                tracing::error!(code, detail = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, code, detail)
            }
        };

        (status, Json(ErrorBody { detail, code })).into_response()
    }
}
