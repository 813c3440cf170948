use eh_core::HubError;
use eh_core::store::Store;
use rusqlite::Connection;
use std::borrow::Borrow;

use crate::booking_repo::BookingRepo;
use crate::event_repo::EventRepo;

/// SQLite-backed [`Store`]. `C` is anything that hands out a connection: a
/// bare [`Connection`] in tests, a pooled one when serving.
pub struct DbStore<C = Connection> {
    conn: C,
}

impl<C: Borrow<Connection>> DbStore<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn.borrow()
    }
}

impl<C: Borrow<Connection>> Store for DbStore<C> {
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;
    type Bookings<'a>
        = BookingRepo<'a>
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(self.connection())
    }

    fn bookings(&self) -> Self::Bookings<'_> {
        BookingRepo::new(self.connection())
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, HubError>
    where
        F: FnOnce(&Self) -> Result<T, HubError>,
    {
        self.connection()
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| HubError::Internal {
                message: err.to_string(),
            })?;
        let result = f(self);
        match result {
            Ok(value) => {
                self.connection()
                    .execute_batch("COMMIT")
                    .map_err(|err| HubError::Internal {
                        message: err.to_string(),
                    })?;
                Ok(value)
            }
            Err(err) => {
                self.connection()
                    .execute_batch("ROLLBACK")
                    .map_err(|rollback_err| HubError::Internal {
                        message: rollback_err.to_string(),
                    })?;
                Err(err)
            }
        }
    }
}
