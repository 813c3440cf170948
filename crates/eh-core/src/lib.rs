pub mod bookings;
pub mod error;
pub mod events;
pub mod hub;
pub mod slug;
pub mod store;
pub mod validation;

pub mod types;

pub use crate::error::HubError;
pub use crate::hub::EventHub;
pub use crate::store::Store;
