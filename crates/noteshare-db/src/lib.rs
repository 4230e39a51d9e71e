//! # noteshare-db
//!
//! PostgreSQL storage layer for noteshare.
//!
//! This crate provides:
//! - Connection pool management
//! - Note metadata repository with substring search and subject filtering
//! - Chunked blob storage for uploaded files
//! - In-memory implementations of both stores
//!
//! ## Example
//!
//! ```rust,ignore
//! use noteshare_db::{Database, PoolConfig};
//! use noteshare_core::{BlobStore, NoteFilter, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/noteshare", PoolConfig::default()).await?;
//!     let notes = db.notes.find(&NoteFilter::new().subject(Some("Math"))).await?;
//!     println!("{} math notes", notes.len());
//!     Ok(())
//! }
//! ```
pub mod blobs;
pub mod memory;
pub mod notes;
pub mod pool;

pub use noteshare_core::{Error, Result};

pub use blobs::PgBlobStore;
pub use memory::{MemoryBlobStore, MemoryNoteRepository};
pub use notes::{NoteFilterQueryBuilder, PgNoteRepository};
pub use pool::{create_lazy_pool, create_pool, PoolConfig};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with both stores sharing one pool.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note metadata repository.
    pub notes: PgNoteRepository,
    /// Chunked file content store.
    pub blobs: PgBlobStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            blobs: PgBlobStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect eagerly, failing if the database cannot be reached.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Build the pool without connecting; errors surface on first use.
    pub fn connect_lazy(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_lazy_pool(url, config)?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations (tables and indexes).
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Round-trip a trivial query to verify connectivity.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
