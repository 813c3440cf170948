use crate::assets::ImageUpload;
use crate::middleware::correlation::CorrelationId;
use crate::routes::error::{ErrorEnvelope, bad_request, internal, map_error, payload_too_large};
use crate::{AppState, build_hub};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use eh_core::HubError;
use eh_core::types::list;
use eh_core::types::{CreateEventInput, Event, EventFields, UpdateEventInput};
use eh_core::validation::validate_event_fields;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    pub message: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub message: String,
    pub data: Event,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedEventResponse {
    pub message: String,
    pub event: Event,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{slug}", get(get_event).patch(update_event))
        .route("/events/{slug}/similar", get(similar_events))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, body = EventListResponse),
        (status = 500, body = ErrorEnvelope)
    )
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> Response {
    let hub = match build_hub(&state).await {
        Ok(hub) => hub,
        Err(err) => return internal("Event Fetch Failed", err, Some(correlation.0)).into_response(),
    };
    match hub.events().list() {
        Ok(events) => Json(EventListResponse {
            message: "Events fetched successfully".to_string(),
            events,
        })
        .into_response(),
        Err(err) => internal("Event Fetch Failed", err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/events/{slug}",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, body = EventResponse),
        (status = 400, body = ErrorEnvelope),
        (status = 404, body = ErrorEnvelope)
    )
)]
pub(crate) async fn get_event(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(slug): Path<String>,
) -> Response {
    let hub = match build_hub(&state).await {
        Ok(hub) => hub,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match hub.events().get_by_slug(&slug) {
        Ok(Some(event)) => Json(EventResponse {
            message: "Event retrieved successfully".to_string(),
            data: event,
        })
        .into_response(),
        Ok(None) => map_error(
            &HubError::Event(eh_core::error::EventError::NotFound),
            Some(correlation.0),
        )
        .into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body(content = CreateEventInput, content_type = "multipart/form-data",
        description = "Event fields as text parts, `tags` and `agenda` as JSON arrays, `image` as a file"),
    responses(
        (status = 201, body = CreatedEventResponse),
        (status = 400, body = ErrorEnvelope),
        (status = 413, body = ErrorEnvelope),
        (status = 500, body = ErrorEnvelope)
    )
)]
pub(crate) async fn create_event(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    multipart: Multipart,
) -> Response {
    let correlation = Some(correlation.0);
    let mut form = match EventForm::read(multipart).await {
        Ok(form) => form,
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(limit = state.config.max_upload_bytes, "event submission too large");
            return payload_too_large(state.config.max_upload_bytes, correlation).into_response();
        }
        Err(err) => {
            return bad_request(format!("Invalid form data: {err}"), correlation).into_response();
        }
    };
    let Some(image) = form.image.take() else {
        return bad_request("Image file is required", correlation).into_response();
    };
    let fields = match form.fields() {
        Ok(fields) => fields,
        Err(message) => return bad_request(message, correlation).into_response(),
    };
    // Reject bad submissions before anything reaches the asset host.
    if let Err(err) = validate_event_fields(fields.clone()) {
        return map_error(&HubError::from(err), correlation).into_response();
    }

    let image_url = match state.assets.upload(image).await {
        Ok(url) => url,
        Err(err) => return internal("Event creation failed", err, correlation).into_response(),
    };

    let hub = match build_hub(&state).await {
        Ok(hub) => hub,
        Err(err) => return internal("Event creation failed", err, correlation).into_response(),
    };
    let input = CreateEventInput {
        fields,
        image: image_url,
    };
    match hub.events().create(input) {
        Ok(event) => (
            StatusCode::CREATED,
            Json(CreatedEventResponse {
                message: "Event created successfully".to_string(),
                event,
            }),
        )
            .into_response(),
        Err(err) => map_error(&err, correlation).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/events/{slug}",
    params(("slug" = String, Path, description = "Event slug")),
    request_body = UpdateEventInput,
    responses(
        (status = 200, body = EventResponse),
        (status = 400, body = ErrorEnvelope),
        (status = 404, body = ErrorEnvelope),
        (status = 409, body = ErrorEnvelope)
    )
)]
pub(crate) async fn update_event(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(slug): Path<String>,
    Json(input): Json<UpdateEventInput>,
) -> Response {
    let hub = match build_hub(&state).await {
        Ok(hub) => hub,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match hub.events().update(&slug, input) {
        Ok(event) => Json(EventResponse {
            message: "Event updated successfully".to_string(),
            data: event,
        })
        .into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/events/{slug}/similar",
    params(("slug" = String, Path, description = "Event slug")),
    responses((status = 200, body = EventListResponse))
)]
pub(crate) async fn similar_events(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    let events = match build_hub(&state).await {
        Ok(hub) => hub.events().similar(&slug),
        Err(err) => {
            warn!(%slug, error = %err, "similar events unavailable");
            Vec::new()
        }
    };
    Json(EventListResponse {
        message: "Similar events fetched successfully".to_string(),
        events,
    })
    .into_response()
}

/// The parts of a multipart event submission.
#[derive(Debug, Default)]
struct EventForm {
    text: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl EventForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "image" {
                form.image = read_image(field).await?;
            } else {
                let value = field.text().await?;
                form.text.insert(name, value);
            }
        }
        Ok(form)
    }

    fn take(&mut self, key: &str) -> String {
        self.text.remove(key).unwrap_or_default()
    }

    fn list(&mut self, key: &str) -> Result<Vec<String>, String> {
        let raw = self.take(key);
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        list::decode_strict(&raw).map_err(|err| format!("Invalid JSON in {key}: {err}"))
    }

    fn fields(mut self) -> Result<EventFields, String> {
        Ok(EventFields {
            title: self.take("title"),
            description: self.take("description"),
            overview: self.take("overview"),
            venue: self.take("venue"),
            location: self.take("location"),
            date: self.take("date"),
            time: self.take("time"),
            mode: self.take("mode"),
            audience: self.take("audience"),
            agenda: self.list("agenda")?,
            organizer: self.take("organizer"),
            tags: self.list("tags")?,
        })
    }
}

async fn read_image(field: Field<'_>) -> Result<Option<ImageUpload>, MultipartError> {
    let file_name = field.file_name().unwrap_or("image").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}
