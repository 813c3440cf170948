use crate::routes::error::classify;
use crate::{AppState, build_hub};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use eh_core::HubError;
use eh_core::types::{Booking, CreateBookingInput};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Result of a booking attempt. Failures carry a human-readable `error` and
/// a stable `reason` code.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl BookingOutcome {
    pub fn booked(booking: Booking) -> Self {
        Self {
            success: true,
            booking: Some(booking),
            error: None,
            reason: None,
        }
    }

    pub fn failed(err: &HubError) -> (StatusCode, Self) {
        let (status, reason, message) = classify(err);
        let message = if status.is_server_error() {
            "Failed to create booking".to_string()
        } else {
            message
        };
        (
            status,
            Self {
                success: false,
                booking: None,
                error: Some(message),
                reason: Some(reason),
            },
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(create_booking))
        .with_state(state)
}

/// Books a seat and logs the outcome as `booking_created` / `booking_failed`.
pub async fn book(state: &AppState, input: CreateBookingInput) -> (StatusCode, BookingOutcome) {
    let event_id = input.event_id.clone();
    let result = match build_hub(state).await {
        Ok(hub) => hub.bookings().create(input),
        Err(err) => Err(err),
    };
    match result {
        Ok(booking) => {
            info!(
                outcome = "booking_created",
                booking_id = %booking.id,
                event_id = %booking.event_id,
                "booking recorded"
            );
            (StatusCode::CREATED, BookingOutcome::booked(booking))
        }
        Err(err) => {
            let (status, outcome) = BookingOutcome::failed(&err);
            if status.is_server_error() {
                error!(outcome = "booking_failed", %event_id, error = %err, "booking failed");
            } else {
                warn!(outcome = "booking_failed", %event_id, reason = ?outcome.reason, "booking rejected");
            }
            (status, outcome)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingInput,
    responses(
        (status = 201, body = BookingOutcome),
        (status = 400, body = BookingOutcome),
        (status = 404, body = BookingOutcome),
        (status = 500, body = BookingOutcome)
    )
)]
pub(crate) async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> Response {
    let (status, outcome) = book(&state, input).await;
    (status, Json(outcome)).into_response()
}
