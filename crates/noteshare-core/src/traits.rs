//! Storage traits for noteshare.
//!
//! The note service depends only on these interfaces; PostgreSQL and
//! in-memory implementations live in `noteshare-db`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewNote, Note, NoteFilter, StoredBlob};

/// Repository for note metadata.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Find all notes matching the filter, newest upload first.
    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>>;

    /// Fetch a single note, `None` when no record has this id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>>;

    /// Insert a new note and return the id assigned to it.
    async fn insert(&self, note: NewNote) -> Result<Uuid>;

    /// Atomically add one to the note's download counter.
    ///
    /// Returns `false` when no record has this id.
    async fn increment_download_count(&self, id: Uuid) -> Result<bool>;

    /// Distinct subject values across all notes, in no particular order.
    async fn distinct_subjects(&self) -> Result<Vec<String>>;
}

/// Binary object storage keyed by an opaque identifier.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name` and return the new blob id.
    async fn put(&self, data: &[u8], name: &str) -> Result<Uuid>;

    /// Read a blob back, `None` when no blob has this id.
    async fn get(&self, id: Uuid) -> Result<Option<StoredBlob>>;
}
