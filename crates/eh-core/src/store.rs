use crate::HubError;
use crate::bookings::BookingRepository;
use crate::events::EventRepository;

pub trait Store {
    type Events<'a>: EventRepository
    where
        Self: 'a;
    type Bookings<'a>: BookingRepository
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_>;
    fn bookings(&self) -> Self::Bookings<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, HubError>
    where
        F: FnOnce(&Self) -> Result<T, HubError>;
}
