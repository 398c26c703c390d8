//! SQLite persistence layer for Probe.
//!
//! This crate provides async database operations for accounts (credit balance
//! and AI toggle), fixed-window rate-limit counters, and saved analyses using
//! SQLx with SQLite.
//!
//! Every mutation that other components rely on for consistency is a single
//! SQL statement, so concurrent requests for the same account never lose an
//! update even though nothing here takes an application-level lock.
//!
//! # Example
//!
//! ```no_run
//! use database::{account, Database, NewAccount};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:probe.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let new = NewAccount::new("c27fb365-0c84-4cf2-8555-814bb065e448", "Ada Lovelace", "ada@example.com");
//!     let created = account::create_account(db.pool(), &new, 0).await?;
//!     println!("{} has {} credits", created.fullname, created.credits);
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod analysis;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Account, AnalysisFilter, AnalysisRecord, AnalysisSummary, KeyValue, NewAccount, NewAnalysis,
    RateLimitRecord, RateLimitScope,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for concurrent requests that each touch the account, its
    /// counters and the analyses table.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that never expires, so every
    /// query sees the same database for the lifetime of the handle.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_account_crud() {
        let db = test_db().await;

        // Create
        let new = NewAccount::new("acct-1", "Alice Doe", "alice@example.com");
        let created = account::create_account(db.pool(), &new, 1_000).await.unwrap();
        assert_eq!(created.credits, 50);
        assert!(created.enable_ai_analysis);

        // Read
        let fetched = account::get_account(db.pool(), "acct-1").await.unwrap();
        assert_eq!(fetched.fullname, "Alice Doe");
        assert_eq!(fetched.credit_refill_date, 1_000);

        // Update
        let updated = account::update_profile(db.pool(), "acct-1", "Alice Smith", "https://a/b.png")
            .await
            .unwrap();
        assert_eq!(updated.fullname, "Alice Smith");
        assert_eq!(updated.avatar, "https://a/b.png");

        // Delete
        account::delete_account(db.pool(), "acct-1").await.unwrap();
        let result = account::get_account(db.pool(), "acct-1").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = test_db().await;

        let first = NewAccount::new("acct-1", "Alice Doe", "alice@example.com");
        account::create_account(db.pool(), &first, 0).await.unwrap();

        let second = NewAccount::new("acct-2", "Alice Again", "alice@example.com");
        let result = account::create_account(db.pool(), &second, 0).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }
}
