//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;

/// Shared context for all API routes and middleware.
///
/// SQLite writes are single-writer, so the connection lives behind a
/// mutex; handlers take the lock for the duration of their queries and
/// never hold it across an await point.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("db lock poisoned".into()))
    }
}

/// The bearer token presented on the current request, injected by the
/// auth middleware so logout can revoke exactly this session.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);
