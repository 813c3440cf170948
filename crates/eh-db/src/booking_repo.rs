use eh_core::bookings::BookingRepository;
use eh_core::error::BookingError;
use eh_core::types::{Booking, BookingId, EventId};
use rusqlite::{Connection, params};

use crate::util::{DbError, booking_storage, from_rfc3339, to_rfc3339};

pub struct BookingRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> BookingRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl BookingRepository for BookingRepo<'_> {
    fn insert(&self, booking: &Booking) -> Result<(), BookingError> {
        self.conn
            .execute(
                "INSERT INTO bookings (id, event_id, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    booking.id.as_str(),
                    booking.event_id.as_str(),
                    booking.email,
                    to_rfc3339(&booking.created_at),
                    to_rfc3339(&booking.updated_at),
                ],
            )
            .map_err(booking_storage)?;
        Ok(())
    }

    fn count_for_event(&self, event_id: &EventId) -> Result<u32, BookingError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM bookings WHERE event_id = ?1",
                [event_id.as_str()],
                |row| row.get(0),
            )
            .map_err(booking_storage)?;
        u32::try_from(count).map_err(booking_storage)
    }

    fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Booking>, BookingError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, event_id, email, created_at, updated_at FROM bookings WHERE event_id = ?1 ORDER BY created_at ASC, id ASC",
            )
            .map_err(booking_storage)?;
        let mut rows = stmt.query([event_id.as_str()]).map_err(booking_storage)?;
        let mut bookings = Vec::new();
        while let Some(row) = rows.next().map_err(booking_storage)? {
            bookings.push(map_booking_row(row)?);
        }
        Ok(bookings)
    }
}

fn map_booking_row(row: &rusqlite::Row<'_>) -> Result<Booking, BookingError> {
    let get = |idx: usize| -> Result<String, BookingError> { row.get(idx).map_err(booking_storage) };
    let invalid_id = |err: eh_core::types::IdError| DbError::InvalidId {
        message: err.to_string(),
    };

    Ok(Booking {
        id: BookingId::new(get(0)?).map_err(invalid_id)?,
        event_id: EventId::new(get(1)?).map_err(invalid_id)?,
        email: get(2)?,
        created_at: from_rfc3339(&get(3)?)?,
        updated_at: from_rfc3339(&get(4)?)?,
    })
}
