use axum::Json;
use axum::http::StatusCode;
use eh_core::HubError;
use eh_core::error::{BookingError, EventError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: &'static str, message: impl Into<String>, correlation_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            code,
            correlation_id,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

pub type ApiFailure = (StatusCode, Json<ErrorEnvelope>);

pub fn bad_request(message: impl Into<String>, correlation_id: Option<String>) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorEnvelope::new("invalid_input", message, correlation_id)),
    )
}

pub fn payload_too_large(limit: usize, correlation_id: Option<String>) -> ApiFailure {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ErrorEnvelope::new(
            "payload_too_large",
            format!("Upload exceeds the {limit} byte limit"),
            correlation_id,
        )),
    )
}

/// A server-side failure: `summary` is what the client sees as the message,
/// the underlying cause goes into `error`.
pub fn internal(
    summary: &str,
    cause: impl std::fmt::Display,
    correlation_id: Option<String>,
) -> ApiFailure {
    error!(error = %cause, "{summary}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new("internal_error", summary, correlation_id).with_error(cause.to_string())),
    )
}

pub fn map_error(err: &HubError, correlation_id: Option<String>) -> ApiFailure {
    let (status, code, message) = classify(err);
    if status.is_server_error() {
        return internal("Internal server error", err, correlation_id);
    }
    (status, Json(ErrorEnvelope::new(code, message, correlation_id)))
}

/// Status, stable code and client-facing message for a domain error.
pub fn classify(err: &HubError) -> (StatusCode, &'static str, String) {
    match err {
        HubError::Event(event) => map_event_error(event),
        HubError::Booking(booking) => map_booking_error(booking),
        HubError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_event_error(err: &EventError) -> (StatusCode, &'static str, String) {
    match err {
        EventError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Event not found".to_string()),
        EventError::Invalid { message, .. } => {
            (StatusCode::BAD_REQUEST, "validation_failed", message.clone())
        }
        EventError::InvalidInput { message } => {
            (StatusCode::BAD_REQUEST, "invalid_input", message.clone())
        }
        EventError::SlugConflict { .. } => (StatusCode::CONFLICT, "conflict", err.to_string()),
        EventError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_booking_error(err: &BookingError) -> (StatusCode, &'static str, String) {
    let status = match err {
        BookingError::InvalidEmail | BookingError::InvalidEventId { .. } => StatusCode::BAD_REQUEST,
        BookingError::EventNotFound { .. } => StatusCode::NOT_FOUND,
        BookingError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.reason(), err.to_string())
}
