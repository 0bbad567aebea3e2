//! Error responses for the JSON API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use streamscope_core::catalog::{CatalogError, ErrorKind};

/// Catalog error rendered as an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError(pub CatalogError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
    status_code: u16,
}

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ErrorKind::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::InvalidService | ErrorKind::InvalidParameter => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CatalogError::InvalidParameter {
            name: "body".to_string(),
            reason: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let retry_after = match &self.0 {
            CatalogError::UpstreamRateLimited {
                retry_after_secs: Some(seconds),
            } => Some(*seconds),
            _ => None,
        };

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            status_code: status.as_u16(),
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}
