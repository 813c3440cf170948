pub mod booking_repo;
pub mod event_repo;
pub mod pool;
pub mod schema;
pub mod store;
pub mod util;

pub use pool::{ConnectionPool, PoolError, PooledConnection};
pub use store::DbStore;
