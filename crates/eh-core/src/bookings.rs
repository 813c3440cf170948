use crate::error::BookingError;
use crate::types::{Booking, EventId};

pub trait BookingRepository {
    fn insert(&self, booking: &Booking) -> Result<(), BookingError>;
    fn count_for_event(&self, event_id: &EventId) -> Result<u32, BookingError>;
    fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Booking>, BookingError>;
}
