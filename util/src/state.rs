//! Application state container shared across Axum route handlers and services.
//!
//! Holds the process-wide handles created once at startup: the SeaORM
//! connection pool and the token manager over the ephemeral store.

use cache::TokenManager;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    tokens: TokenManager,
}

impl AppState {
    pub fn new(db: DatabaseConnection, tokens: TokenManager) -> Self {
        Self { db, tokens }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    pub fn tokens_clone(&self) -> TokenManager {
        self.tokens.clone()
    }
}
