//! Core data models for noteshare.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::DEFAULT_UPLOADER;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Metadata for one uploaded document.
///
/// Serialized with the camelCase field names clients expect; `id` and
/// `fileId` render as plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    /// Course number.
    pub number: Option<String>,
    pub description: String,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
    pub file_name: String,
    pub file_id: Uuid,
    /// Client-supplied, never verified against the stored blob.
    pub file_size: String,
    pub download_count: i64,
}

/// Fields for a note about to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub subject: String,
    pub number: Option<String>,
    pub description: String,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
    pub file_name: String,
    pub file_id: Uuid,
    pub file_size: String,
}

impl NewNote {
    /// Build the record for a freshly stored blob from submitted form fields.
    ///
    /// `uploaded_by` falls back to "Anonymous", `description` and
    /// `file_size` to the empty string. `download_count` is not part of the
    /// insert: every new note starts at zero.
    ///
    /// A missing `title` or `subject` is stored as the empty string rather
    /// than rejected; upload validation only concerns the file itself. An
    /// empty subject is still a distinct value for subject listing.
    pub fn from_fields(
        fields: NoteFields,
        file_name: String,
        file_id: Uuid,
        upload_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: fields.title.unwrap_or_default(),
            subject: fields.subject.unwrap_or_default(),
            number: fields.course_number,
            description: fields.description.unwrap_or_default(),
            uploaded_by: fields
                .uploaded_by
                .unwrap_or_else(|| DEFAULT_UPLOADER.to_string()),
            upload_date,
            file_name,
            file_id,
            file_size: fields.file_size.unwrap_or_default(),
        }
    }

    /// Materialize the stored record once an id has been assigned.
    pub fn into_note(self, id: Uuid) -> Note {
        Note {
            id,
            title: self.title,
            subject: self.subject,
            number: self.number,
            description: self.description,
            uploaded_by: self.uploaded_by,
            upload_date: self.upload_date,
            file_name: self.file_name,
            file_id: self.file_id,
            file_size: self.file_size,
            download_count: 0,
        }
    }
}

/// Form fields accompanying an upload, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub course_number: Option<String>,
    pub description: Option<String>,
    pub uploaded_by: Option<String>,
    pub file_size: Option<String>,
}

/// A buffered file part from an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name as sent by the client, before sanitization.
    pub file_name: String,
    pub data: Vec<u8>,
}

// =============================================================================
// LIST FILTER
// =============================================================================

/// Filter for listing notes.
///
/// `search` is a case-insensitive substring match against title, subject
/// and course number; `subject` is exact equality. When both are set a
/// note must satisfy both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub search: Option<String>,
    pub subject: Option<String>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query. Empty strings leave the filter unset.
    pub fn search(mut self, query: Option<impl Into<String>>) -> Self {
        self.search = query.map(Into::into).filter(|q| !q.is_empty());
        self
    }

    /// Set the exact subject. Empty strings leave the filter unset.
    pub fn subject(mut self, subject: Option<impl Into<String>>) -> Self {
        self.subject = subject.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.subject.is_none()
    }

    /// Evaluate the filter against a record in memory.
    pub fn matches(&self, note: &Note) -> bool {
        if let Some(subject) = &self.subject {
            if note.subject != *subject {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let needle = query.to_lowercase();
            let hit = |field: &str| field.to_lowercase().contains(&needle);
            if !(hit(&note.title) || hit(&note.subject) || note.number.as_deref().is_some_and(hit))
            {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// BLOB TYPES
// =============================================================================

/// Binary payload read back from the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Name the blob was stored under.
    pub name: String,
    pub data: Vec<u8>,
}
