use chrono::{DateTime, NaiveDate, Utc};
use eh_core::error::{BookingError, EventError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("json encode failed: {message}")]
    JsonEncode { message: String },
    #[error("json decode failed: {message}")]
    JsonDecode { message: String },
    #[error("invalid enum value: {value}")]
    InvalidEnum { value: String },
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
    #[error("invalid date: {value}")]
    InvalidDate { value: String },
    #[error("invalid id: {message}")]
    InvalidId { message: String },
}

impl From<DbError> for EventError {
    fn from(value: DbError) -> Self {
        EventError::Storage {
            message: value.to_string(),
        }
    }
}

impl From<DbError> for BookingError {
    fn from(value: DbError) -> Self {
        BookingError::Storage {
            message: value.to_string(),
        }
    }
}

pub fn event_storage<E: Display>(err: E) -> EventError {
    EventError::Storage {
        message: err.to_string(),
    }
}

pub fn booking_storage<E: Display>(err: E) -> BookingError {
    BookingError::Storage {
        message: err.to_string(),
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::InvalidTimestamp {
            value: value.to_string(),
        })
}

pub fn to_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn from_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DbError::InvalidDate {
        value: value.to_string(),
    })
}

pub fn encode_enum<T: Serialize>(value: &T) -> Result<String, DbError> {
    let json = serde_json::to_value(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })?;
    match json {
        Value::String(value) => Ok(value),
        other => Err(DbError::InvalidEnum {
            value: other.to_string(),
        }),
    }
}

pub fn decode_enum<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    let json = Value::String(value.to_string());
    serde_json::from_value(json).map_err(|err| DbError::JsonDecode {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eh_core::types::EventMode;

    #[test]
    fn test_enum_round_trip() {
        let encoded = encode_enum(&EventMode::Hybrid).unwrap();
        assert_eq!(encoded, "hybrid");
        let decoded: EventMode = decode_enum(&encoded).unwrap();
        assert_eq!(decoded, EventMode::Hybrid);
        assert!(decode_enum::<EventMode>("virtual").is_err());
    }

    #[test]
    fn test_date_column_format() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        assert_eq!(to_date(&date), "2024-06-04");
        assert_eq!(from_date("2024-06-04").unwrap(), date);
        assert!(matches!(from_date("June 4"), Err(DbError::InvalidDate { .. })));
    }
}
