use crate::error::{BookingError, EventError};
use crate::types::list::tidy;
use crate::types::{EventFields, EventId, EventMode};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_TITLE_LEN: usize = 3;

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time pattern"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid email pattern")
});

static STORED_EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
        .expect("valid stored email pattern")
});

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// A fully validated event body, ready to be stamped with id, slug, image and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEventFields {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub venue: String,
    pub location: String,
    pub date: NaiveDate,
    pub time: String,
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

/// Runs every per-field rule against a submission and normalizes it. The
/// first failing field is reported.
pub fn validate_event_fields(fields: EventFields) -> Result<ValidEventFields, EventError> {
    let title = required("title", &fields.title)?;
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(EventError::invalid(
            "title",
            format!("title must be at least {MIN_TITLE_LEN} characters"),
        ));
    }
    if crate::slug::base_slug(&title).is_empty() {
        return Err(EventError::invalid(
            "title",
            "title must contain at least one letter or digit",
        ));
    }

    let description = required("description", &fields.description)?;
    let overview = required("overview", &fields.overview)?;
    let venue = required("venue", &fields.venue)?;
    let location = required("location", &fields.location)?;
    let date = normalize_date(&fields.date)?;
    validate_time(&fields.time)?;
    let mode = fields
        .mode
        .parse::<EventMode>()
        .map_err(|err| EventError::invalid("mode", err.to_string()))?;
    let audience = required("audience", &fields.audience)?;

    let agenda = tidy(fields.agenda, false);
    if agenda.is_empty() {
        return Err(EventError::invalid(
            "agenda",
            "agenda must contain at least one item",
        ));
    }
    let organizer = required("organizer", &fields.organizer)?;
    let tags = tidy(fields.tags, true);
    if tags.is_empty() {
        return Err(EventError::invalid("tags", "at least one tag is required"));
    }

    Ok(ValidEventFields {
        title,
        description,
        overview,
        venue,
        location,
        date,
        time: fields.time,
        mode,
        audience,
        agenda,
        organizer,
        tags,
    })
}

pub fn validate_image(image: &str) -> Result<String, EventError> {
    required("image", image)
}

fn required(field: &'static str, value: &str) -> Result<String, EventError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EventError::invalid(field, format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Parses a calendar date in any of the accepted spellings.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, EventError> {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(EventError::invalid("date", "date must be a valid date string"))
}

/// Checks a 24-hour `HH:mm` time. No reformatting is attempted.
pub fn validate_time(raw: &str) -> Result<(), EventError> {
    if TIME_PATTERN.is_match(raw) {
        Ok(())
    } else {
        Err(EventError::invalid(
            "time",
            "time must be in HH:mm format (24-hour)",
        ))
    }
}

/// Trims and lowercases `raw`, then checks it against both the submission
/// and the stored-address patterns.
pub fn normalize_email(raw: &str) -> Result<String, BookingError> {
    let email = raw.trim().to_lowercase();
    if EMAIL_PATTERN.is_match(&email) && STORED_EMAIL_PATTERN.is_match(&email) {
        Ok(email)
    } else {
        Err(BookingError::InvalidEmail)
    }
}

pub fn parse_event_id(raw: &str) -> Result<EventId, BookingError> {
    EventId::new(raw.trim().to_string()).map_err(|_| BookingError::InvalidEventId {
        value: raw.to_string(),
    })
}
