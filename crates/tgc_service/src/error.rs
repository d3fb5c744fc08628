//! Error types for the HTTP service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tgc_catalog::CatalogError;
use tgc_packager::PackagerError;
use tracing::{error, info};

/// Result type alias for service handlers.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by request handlers.
///
/// Caller errors answer 400 with their message. Everything else answers
/// 500 with an empty body; the detail only goes to the log.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Packaging failed: {0}")]
    Packaging(#[from] PackagerError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Packaging(e) if e.is_caller_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_REQUEST {
            info!("Rejected request: {}", self);
            let message = match self {
                ServiceError::Packaging(e) => e.to_string(),
                other => other.to_string(),
            };
            return (status, message).into_response();
        }
        if status == StatusCode::NOT_FOUND {
            info!("{}", self);
        } else {
            error!("Exception: {:#}", anyhow::Error::new(self));
        }
        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::from(PackagerError::UnknownTemplate("9.9".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(PackagerError::evaluation("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::NotFound("docs/x.md".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
