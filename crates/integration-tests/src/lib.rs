//! Integration tests for Diagnostico.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable PostgreSQL database
//! export DATABASE_URL=postgres://localhost/diagnostico_test
//!
//! # Run the ignored database tests
//! cargo test -p diagnostico-integration-tests -- --ignored
//! ```
//!
//! Each [`TestDatabase`] lives in its own freshly created schema, so tests
//! can run in parallel against one database without seeing each other's
//! rows.

use async_trait::async_trait;
use diagnostico_web::db::{PgStore, init_schema};
use diagnostico_web::services::encyclopedia::{Article, Encyclopedia, EncyclopediaError};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

/// A migrated schema private to one test.
pub struct TestDatabase {
    pub pool: PgPool,
    schema: String,
}

impl TestDatabase {
    /// Create a schema named after a fresh UUID, point a pool's
    /// `search_path` at it and create the application tables.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is unset or the database is unreachable.
    pub async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let schema = format!("test_{}", Uuid::new_v4().simple());

        let admin = PgPool::connect(&url)
            .await
            .expect("Failed to connect to test database");
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");
        admin.close().await;

        let options: PgConnectOptions = url.parse().expect("Invalid DATABASE_URL");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await
            .expect("Failed to connect to test schema");

        init_schema(&pool).await.expect("Failed to create tables");

        Self { pool, schema }
    }

    /// A [`PgStore`] over this schema.
    #[must_use]
    pub fn store(&self) -> PgStore {
        PgStore::new(self.pool.clone())
    }

    /// Count the rows of `table`.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }

    /// Drop the schema and everything in it.
    pub async fn cleanup(self) {
        let Self { pool, schema } = self;
        let _ = sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
            .execute(&pool)
            .await;
        pool.close().await;
    }
}

/// An encyclopedia that never finds anything, so submissions store the
/// fallback text without network access.
pub struct EmptyEncyclopedia;

#[async_trait]
impl Encyclopedia for EmptyEncyclopedia {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>, EncyclopediaError> {
        Ok(Vec::new())
    }

    async fn article(&self, title: &str) -> Result<Article, EncyclopediaError> {
        Err(EncyclopediaError::NotFound(title.to_string()))
    }
}
