use utoipa::OpenApi;

use crate::routes::bookings::BookingOutcome;
use crate::routes::error::ErrorEnvelope;
use crate::routes::events::{CreatedEventResponse, EventListResponse, EventResponse};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use eh_core::types::enums::EventMode;
use eh_core::types::ids::{BookingId, EventId};
use eh_core::types::io::{CreateBookingInput, CreateEventInput, EventFields, UpdateEventInput};
use eh_core::types::{Booking, Event};

#[derive(OpenApi)]
#[openapi(
    info(title = "evhub API", description = "Tech events catalog and bookings"),
    paths(
        crate::routes::events::list_events,
        crate::routes::events::get_event,
        crate::routes::events::create_event,
        crate::routes::events::update_event,
        crate::routes::events::similar_events,
        crate::routes::bookings::create_booking
    ),
    components(schemas(
        Event,
        EventMode,
        EventId,
        EventFields,
        CreateEventInput,
        UpdateEventInput,
        Booking,
        BookingId,
        CreateBookingInput,
        EventListResponse,
        EventResponse,
        CreatedEventResponse,
        BookingOutcome,
        ErrorEnvelope
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> impl IntoResponse {
    Html(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>evhub API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: '/api/openapi.json', dom_id: '#swagger-ui' });
    </script>
  </body>
</html>
"#,
    )
}
