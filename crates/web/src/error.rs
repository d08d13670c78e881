//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Errors render as a JSON body
//! `{"error": ..., "details": ...}`; server errors are captured to Sentry
//! before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diagnostico_core::EmailError;
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::articles::ArticlesError;
use crate::services::diagnosis::DiagnosisError;

const MISSING_FIELDS_MESSAGE: &str = "Todos los campos son requeridos";
const INVALID_EMAIL_MESSAGE: &str = "Correo electrónico inválido";
const DIAGNOSIS_FAILED_MESSAGE: &str = "Error en el proceso de diagnóstico";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required form field was absent or blank.
    #[error("Todos los campos son requeridos")]
    MissingFields,

    /// The submitted email is malformed.
    #[error("Correo electrónico inválido: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The diagnosis flow failed for a reason other than the lookup.
    #[error("Error en el proceso de diagnóstico: {0}")]
    Diagnosis(#[from] DiagnosisError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The external articles API probe failed.
    #[error("{0}")]
    ExternalApi(#[from] ArticlesError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Self::Diagnosis(_) | Self::Database(_) | Self::ExternalApi(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Self::MissingFields => (MISSING_FIELDS_MESSAGE.to_string(), None),
            Self::InvalidEmail(err) => (INVALID_EMAIL_MESSAGE.to_string(), Some(err.to_string())),
            // The raw cause is returned to the caller as a debugging aid.
            Self::Diagnosis(err) => (DIAGNOSIS_FAILED_MESSAGE.to_string(), Some(err.to_string())),
            Self::Database(_) => ("Internal server error".to_string(), None),
            Self::ExternalApi(err) => (err.to_string(), None),
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
