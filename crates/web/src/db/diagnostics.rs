//! Diagnostic repository for database operations.

use diagnostico_core::{DiagnosticId, Email, UserId};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Diagnostic, DiagnosticEntry, NewDiagnostic};

#[derive(Debug, sqlx::FromRow)]
struct DiagnosticRow {
    id: i32,
    user_id: i32,
    symptoms: String,
    diagnosis: String,
}

impl From<DiagnosticRow> for Diagnostic {
    fn from(row: DiagnosticRow) -> Self {
        Self {
            id: DiagnosticId::new(row.id),
            user_id: UserId::new(row.user_id),
            symptoms: row.symptoms,
            diagnosis: row.diagnosis,
        }
    }
}

/// A diagnostic row joined with its owner's columns.
#[derive(Debug, sqlx::FromRow)]
struct DiagnosticEntryRow {
    #[sqlx(flatten)]
    diagnostic: DiagnosticRow,
    user_name: String,
    user_email: String,
}

impl TryFrom<DiagnosticEntryRow> for DiagnosticEntry {
    type Error = RepositoryError;

    fn try_from(row: DiagnosticEntryRow) -> Result<Self, Self::Error> {
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            diagnostic: row.diagnostic.into(),
            user_name: row.user_name,
            user_email,
        })
    }
}

/// Repository for diagnostic database operations.
pub struct DiagnosticRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiagnosticRepository<'a> {
    /// Create a new diagnostic repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `user_id` does not reference a user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewDiagnostic) -> Result<Diagnostic, RepositoryError> {
        let row = sqlx::query_as::<_, DiagnosticRow>(
            r"
            INSERT INTO diagnostics (user_id, symptoms, diagnosis)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, symptoms, diagnosis
            ",
        )
        .bind(new.user_id)
        .bind(&new.symptoms)
        .bind(&new.diagnosis)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict(format!("user {} does not exist", new.user_id));
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// List every diagnostic with its owner, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if an owner's email is invalid.
    pub async fn list_with_users(&self) -> Result<Vec<DiagnosticEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiagnosticEntryRow>(
            r"
            SELECT d.id, d.user_id, d.symptoms, d.diagnosis,
                   u.name AS user_name, u.email AS user_email
            FROM diagnostics d
            JOIN users u ON u.id = d.user_id
            ORDER BY d.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(DiagnosticEntry::try_from).collect()
    }
}
