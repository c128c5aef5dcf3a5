//! SQLite persistence layer for the complaint tracker.
//!
//! This crate provides async database operations for accounts, complaints
//! and their timelines, escalations, feedback and system settings using SQLx
//! with SQLite. All complaint mutations go through [`lifecycle`].
//!
//! # Example
//!
//! ```no_run
//! use database::{lifecycle, user, Database, Role, TransitionPolicy, ComplaintStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:complaints.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let user_id = user::create_user(db.pool(), "Bob", "bob@example.com", "<hash>", Role::User).await?;
//!     let complaint_id = lifecycle::submit(
//!         db.pool(),
//!         &lifecycle::NewComplaint {
//!             user_id,
//!             category: "Maintenance",
//!             subject: "Leak",
//!             description: "Pipe leaking",
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     lifecycle::change_status(
//!         db.pool(),
//!         TransitionPolicy::Open,
//!         complaint_id,
//!         ComplaintStatus::Resolved,
//!         Some("Fixed"),
//!         user_id,
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod complaint;
pub mod error;
pub mod feedback;
pub mod lifecycle;
pub mod models;
pub mod report;
pub mod stats;
pub mod status;
pub mod system_config;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use lifecycle::NewComplaint;
pub use models::{
    Complaint, ComplaintUpdate, ComplaintWithTimeline, DashboardStats, Escalation, Feedback,
    ReportRow, User, UserCredentials, UserStats, UserSummary,
};
pub use report::ReportFilter;
pub use status::{ComplaintStatus, TransitionPolicy};
pub use user::Role;
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
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/complaints.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
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
