pub mod booking;
pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod list;

pub use booking::Booking;
pub use enums::EventMode;
pub use event::Event;
pub use ids::{BookingId, EventId, IdError};
pub use io::{CreateBookingInput, CreateEventInput, EventFields, UpdateEventInput};
