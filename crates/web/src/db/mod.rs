//! Database operations for Diagnostico `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - One row per distinct email that submitted symptoms
//! - `diagnostics` - One row per successful submission, owned by a user
//!
//! # Schema
//!
//! There is no migration framework: [`init_schema`] issues
//! `CREATE TABLE IF NOT EXISTS` for both tables at startup.
//!
//! # Store
//!
//! Handlers never touch the pool directly. They go through the [`Store`]
//! trait, implemented for `PostgreSQL` by [`PgStore`] on top of the
//! per-table repositories.

pub mod diagnostics;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use diagnostico_core::Email;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use diagnostics::DiagnosticRepository;
pub use users::UserRepository;

use crate::models::{Diagnostic, DiagnosticEntry, NewDiagnostic, User};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

const CREATE_USERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE
    )
";

const CREATE_DIAGNOSTICS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS diagnostics (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id),
        symptoms TEXT NOT NULL,
        diagnosis TEXT NOT NULL
    )
";

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the `users` and `diagnostics` tables if they do not exist.
///
/// # Errors
///
/// Returns `sqlx::Error` if either statement fails.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_USERS_TABLE).execute(&mut *tx).await?;
    sqlx::query(CREATE_DIAGNOSTICS_TABLE)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// Persistence port used by the request handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Look up a user by their unique email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    async fn create_user(&self, name: &str, email: &Email) -> Result<User, RepositoryError>;

    /// Insert a diagnostic for an existing user.
    ///
    /// Returns `RepositoryError::Conflict` if the owner does not exist.
    async fn create_diagnostic(
        &self,
        diagnostic: &NewDiagnostic,
    ) -> Result<Diagnostic, RepositoryError>;

    /// Every diagnostic with its owner, in storage order.
    async fn list_diagnostics(&self) -> Result<Vec<DiagnosticEntry>, RepositoryError>;
}

/// [`Store`] backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_email(email).await
    }

    async fn create_user(&self, name: &str, email: &Email) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(name, email).await
    }

    async fn create_diagnostic(
        &self,
        diagnostic: &NewDiagnostic,
    ) -> Result<Diagnostic, RepositoryError> {
        DiagnosticRepository::new(&self.pool).create(diagnostic).await
    }

    async fn list_diagnostics(&self) -> Result<Vec<DiagnosticEntry>, RepositoryError> {
        DiagnosticRepository::new(&self.pool).list_with_users().await
    }
}
