use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event not found")]
    NotFound,
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("slug already in use: {slug}")]
    SlugConflict { slug: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl EventError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid event ID")]
    InvalidEventId { value: String },
    #[error("Event with ID {event_id} does not exist")]
    EventNotFound { event_id: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl BookingError {
    /// Stable machine-readable reason reported to booking clients.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::InvalidEventId { .. } => "invalid_event_id",
            Self::EventNotFound { .. } => "event_not_found",
            Self::Storage { .. } => "internal_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
