//! Note service: the five note operations over the metadata and blob stores.
//!
//! ## Partial failures
//!
//! Creating and downloading each touch both stores with no compensation:
//! - create stores the blob first; if the note insert then fails the blob
//!   stays behind unreferenced.
//! - download bumps the counter first; if reading the blob then fails the
//!   counter stays bumped.
//!
//! Both cases are logged at WARN with the ids involved.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use noteshare_core::{
    is_allowed_extension, sanitize_filename, BlobStore, Error, FileUpload, NewNote, Note,
    NoteFields, NoteFilter, NoteRepository, Result,
};

/// File content and the name a client should save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDownload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Orchestrates the note repository and blob store.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { notes, blobs }
    }

    /// All notes matching the filter, newest upload first.
    pub async fn list_notes(&self, filter: NoteFilter) -> Result<Vec<Note>> {
        let start = Instant::now();
        let notes = self.notes.find(&filter).await?;
        debug!(
            subsystem = "api",
            component = "note_service",
            op = "list",
            search = filter.search.as_deref().unwrap_or(""),
            subject = filter.subject.as_deref().unwrap_or(""),
            result_count = notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed notes"
        );
        Ok(notes)
    }

    /// A single note by id.
    ///
    /// A malformed id is [`Error::InvalidId`], a well-formed id with no
    /// record is [`Error::NotFound`].
    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let id = parse_note_id(id)?;
        self.notes
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))
    }

    /// Validate an upload, store its content, and record the note.
    ///
    /// Validation runs in order (file present, non-empty name, allowed
    /// extension) and touches neither store when it fails.
    pub async fn create_note(&self, upload: Option<FileUpload>, fields: NoteFields) -> Result<Uuid> {
        let upload = upload.ok_or_else(|| Error::InvalidInput("No file part".to_string()))?;
        if upload.file_name.is_empty() {
            return Err(Error::InvalidInput("No selected file".to_string()));
        }
        if !is_allowed_extension(&upload.file_name) {
            return Err(Error::InvalidInput("File type not allowed".to_string()));
        }

        let file_name = sanitize_filename(&upload.file_name);
        let file_id = self.blobs.put(&upload.data, &file_name).await?;

        let note = NewNote::from_fields(fields, file_name.clone(), file_id, Utc::now());
        let note_id = match self.notes.insert(note).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "note_service",
                    op = "create",
                    blob_id = %file_id,
                    error = %e,
                    "Note insert failed after blob was stored; blob is orphaned"
                );
                return Err(e);
            }
        };

        info!(
            subsystem = "api",
            component = "note_service",
            op = "create",
            note_id = %note_id,
            blob_id = %file_id,
            file_name = %file_name,
            size = upload.data.len(),
            "Created note"
        );
        Ok(note_id)
    }

    /// Count a download and return the note's file content.
    pub async fn download_note(&self, id: &str) -> Result<NoteDownload> {
        let id = parse_note_id(id)?;
        let note = self
            .notes
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))?;

        if !self.notes.increment_download_count(id).await? {
            warn!(
                subsystem = "api",
                component = "note_service",
                op = "download",
                note_id = %id,
                "Note disappeared before its download could be counted"
            );
            return Err(Error::NotFound("Note not found".to_string()));
        }

        let blob = match self.blobs.get(note.file_id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                warn!(
                    subsystem = "api",
                    component = "note_service",
                    op = "download",
                    note_id = %id,
                    blob_id = %note.file_id,
                    "Download counted but blob is missing"
                );
                return Err(Error::Storage(format!("File {} not found", note.file_id)));
            }
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "note_service",
                    op = "download",
                    note_id = %id,
                    blob_id = %note.file_id,
                    error = %e,
                    "Download counted but blob read failed"
                );
                return Err(e);
            }
        };

        debug!(
            subsystem = "api",
            component = "note_service",
            op = "download",
            note_id = %id,
            size = blob.data.len(),
            "Served download"
        );
        Ok(NoteDownload {
            file_name: note.file_name,
            data: blob.data,
        })
    }

    /// Distinct subjects across all notes.
    pub async fn list_subjects(&self) -> Result<Vec<String>> {
        self.notes.distinct_subjects().await
    }
}

fn parse_note_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| Error::InvalidId(format!("'{}' is not a valid note id: {}", id, e)))
}
