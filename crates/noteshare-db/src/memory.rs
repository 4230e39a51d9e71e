//! In-memory note and blob stores.
//!
//! Same contracts as the PostgreSQL implementations, backed by maps behind
//! a tokio `RwLock`. Used by tests and by `STORAGE_BACKEND=memory` for
//! local runs without a database. Nothing survives a restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use noteshare_core::{BlobStore, NewNote, Note, NoteFilter, NoteRepository, Result, StoredBlob};

/// In-memory [`NoteRepository`].
#[derive(Debug, Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notes.
    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut matched: Vec<Note> = notes
            .values()
            .filter(|note| filter.matches(note))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(matched)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn insert(&self, note: NewNote) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.notes.write().await.insert(id, note.into_note(id));
        Ok(id)
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<bool> {
        // Read and write happen under one write guard
        let mut notes = self.notes.write().await;
        match notes.get_mut(&id) {
            Some(note) => {
                note.download_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn distinct_subjects(&self) -> Result<Vec<String>> {
        let notes = self.notes.read().await;
        let subjects: HashSet<&String> = notes.values().map(|n| &n.subject).collect();
        Ok(subjects.into_iter().cloned().collect())
    }
}

/// In-memory [`BlobStore`].
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<Uuid, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: &[u8], name: &str) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.blobs.write().await.insert(
            id,
            StoredBlob {
                name: name.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredBlob>> {
        Ok(self.blobs.read().await.get(&id).cloned())
    }
}
