//! Connect-once connection pool.
//!
//! The pool is built once at startup and shared through application state.
//! The first [`ConnectionPool::get`] opens the database and runs migrations;
//! callers arriving while that is in flight wait on the same attempt, and a
//! failed attempt leaves the pool uninitialized so the next caller retries.
//! Later calls reuse idle connections or open fresh ones.

use rusqlite::Connection;
use std::borrow::Borrow;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::schema;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("database initialization failed: {message}")]
    Init { message: String },
    #[error("database open failed: {message}")]
    Open { message: String },
}

pub struct ConnectionPool {
    path: String,
    max_idle: usize,
    ready: OnceCell<()>,
    init_attempts: AtomicUsize,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    pub fn new(path: impl Into<String>, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            max_idle,
            ready: OnceCell::new(),
            init_attempts: AtomicUsize::new(0),
            idle: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    /// Number of times the open-and-migrate step has run, failed attempts
    /// included.
    pub fn init_attempts(&self) -> usize {
        self.init_attempts.load(Ordering::SeqCst)
    }

    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn get(self: &Arc<Self>) -> Result<PooledConnection, PoolError> {
        self.ready
            .get_or_try_init(|| async {
                self.init_attempts.fetch_add(1, Ordering::SeqCst);
                let conn = schema::open_and_migrate(&self.path).map_err(|err| {
                    warn!(path = %self.path, error = %err, "database initialization failed");
                    PoolError::Init {
                        message: err.to_string(),
                    }
                })?;
                info!(path = %self.path, "database ready");
                self.release(conn);
                Ok::<(), PoolError>(())
            })
            .await?;

        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => {
                debug!(path = %self.path, "opening pooled connection");
                schema::open(&self.path).map_err(|err| PoolError::Open {
                    message: err.to_string(),
                })?
            }
        };
        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
        })
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }
}

/// A connection checked out of a [`ConnectionPool`]; returned on drop.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("connection is present until drop"))
    }
}

impl Borrow<Connection> for PooledConnection {
    fn borrow(&self) -> &Connection {
        self
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
