use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::gazette::SourceError;
use crate::workflows::reconcile::{ReconcileServiceError, StoreError};
use crate::workflows::registry::RegistryImportError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Reconcile(ReconcileServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Reconcile(err) => write!(f, "reconciliation error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Reconcile(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Reconcile(err) => match err {
                ReconcileServiceError::Threshold(_)
                | ReconcileServiceError::Source(_)
                | ReconcileServiceError::Registry(_)
                | ReconcileServiceError::MissingRegistry => StatusCode::BAD_REQUEST,
                ReconcileServiceError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
                ReconcileServiceError::Store(_) | ReconcileServiceError::Worker(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ReconcileServiceError> for AppError {
    fn from(value: ReconcileServiceError) -> Self {
        Self::Reconcile(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Reconcile(value.into())
    }
}

impl From<SourceError> for AppError {
    fn from(value: SourceError) -> Self {
        Self::Reconcile(value.into())
    }
}

impl From<RegistryImportError> for AppError {
    fn from(value: RegistryImportError) -> Self {
        Self::Reconcile(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::reconcile::ThresholdError;
    use std::time::Duration;

    #[test]
    fn maps_input_errors_to_bad_request() {
        let error = AppError::from(ReconcileServiceError::Threshold(ThresholdError::Inverted {
            review: 0.5,
            accept: 0.2,
        }));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(ReconcileServiceError::MissingRegistry).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn maps_timeouts_and_store_failures() {
        let timeout = AppError::from(ReconcileServiceError::TimedOut(Duration::from_secs(30)));
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let store = AppError::from(StoreError::Unavailable("offline".to_string()));
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            store.to_string(),
            "reconciliation error: match store unavailable: offline"
        );
    }
}
