//! Note HTTP handlers.
//!
//! Ids arrive as plain path strings and are parsed by the service, so a
//! malformed id surfaces as a 500 like any other store failure rather than
//! as a routing rejection.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use noteshare_core::{Error, FileUpload, Note, NoteFields, NoteFilter};

use crate::{ApiError, AppState};

/// Query parameters for listing notes.
#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    /// Case-insensitive substring of title, subject or course number
    pub search: Option<String>,
    /// Exact subject
    pub subject: Option<String>,
}

/// List notes, newest first.
///
/// # Query Parameters
/// - `search`: free-text filter (optional)
/// - `subject`: exact subject filter (optional)
///
/// # Returns
/// - 200 OK with the full array of matching notes
/// - 500 Internal Server Error if the store fails
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let filter = NoteFilter::new()
        .search(query.search)
        .subject(query.subject);
    let notes = state.notes.list_notes(filter).await?;
    Ok(Json(notes))
}

/// Get a single note.
///
/// # Returns
/// - 200 OK with the note
/// - 404 Not Found if no note has this id
/// - 500 Internal Server Error for a malformed id or store failure
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state.notes.get_note(&id).await?;
    Ok(Json(note))
}

/// Upload a file and create a note for it.
///
/// # Multipart Fields
/// - `file`: the document (required; pdf, doc, docx, jpg, jpeg or png)
/// - `title`, `subject`, `courseNumber`, `description`, `uploadedBy`,
///   `fileSize`: note metadata (optional)
///
/// # Returns
/// - 201 Created with `{ "success": true, "noteId": "<id>" }`
/// - 400 Bad Request for a missing file, empty filename or disallowed type
/// - 413 Payload Too Large when the body exceeds the upload limit
/// - 500 Internal Server Error if a store fails
pub async fn create_note(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<FileUpload> = None;
    let mut fields = NoteFields::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            // Parts without a filename attribute are plain form values, not files
            Some("file") if field.file_name().is_some() => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?.to_vec();
                upload = Some(FileUpload { file_name, data });
            }
            Some("title") => fields.title = Some(field.text().await?),
            Some("subject") => fields.subject = Some(field.text().await?),
            Some("courseNumber") => fields.course_number = Some(field.text().await?),
            Some("description") => fields.description = Some(field.text().await?),
            Some("uploadedBy") => fields.uploaded_by = Some(field.text().await?),
            Some("fileSize") => fields.file_size = Some(field.text().await?),
            _ => {} // ignore unknown fields
        }
    }

    let note_id = state.notes.create_note(upload, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "noteId": note_id.to_string(),
        })),
    ))
}

/// Download a note's file and count the download.
///
/// # Returns
/// - 200 OK with the raw bytes as an attachment named after the note's file
/// - 404 Not Found if no note has this id
/// - 500 Internal Server Error for a malformed id or store failure
pub async fn download_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let download = state.notes.download_note(&id).await?;

    let content_disposition = format!("attachment; filename=\"{}\"", download.file_name);
    let disposition = HeaderValue::from_str(&content_disposition).map_err(|e| {
        ApiError::Internal(Error::Internal(format!(
            "Invalid download filename '{}': {}",
            download.file_name, e
        )))
    })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((StatusCode::OK, headers, download.data))
}
