use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use noteshare_api::{router, ApiConfig, AppState, StorageBackend};
use noteshare_core::{BlobStore, Error, NewNote, Note, NoteFilter, NoteRepository, StoredBlob};
use noteshare_db::{MemoryBlobStore, MemoryNoteRepository};

const BOUNDARY: &str = "noteshare-test-boundary";

// -- Helpers --------------------------------------------------------------

fn test_config() -> ApiConfig {
    ApiConfig {
        storage: StorageBackend::Memory,
        ..ApiConfig::default()
    }
}

fn memory_app() -> Router {
    app_with(
        Arc::new(MemoryNoteRepository::new()),
        Arc::new(MemoryBlobStore::new()),
        &test_config(),
    )
}

fn app_with(
    notes: Arc<dyn NoteRepository>,
    blobs: Arc<dyn BlobStore>,
    config: &ApiConfig,
) -> Router {
    router(AppState::new(notes, blobs), config)
}

/// One multipart part: a text field, or a file when `file_name` is set.
struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    data: &'a [u8],
}

fn text(name: &'static str, value: &'static str) -> Part<'static> {
    Part {
        name,
        file_name: None,
        data: value.as_bytes(),
    }
}

fn file<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        file_name: Some(file_name),
        data,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_note(app: &Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let body = multipart_body(parts);
    let req = Request::builder()
        .method("POST")
        .uri("/api/notes")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Create a note with the given metadata and return its id.
async fn create(app: &Router, title: &'static str, subject: &'static str, number: &'static str) -> String {
    let (status, json) = post_note(
        app,
        &[
            file("notes.pdf", b"%PDF-1.4 body"),
            text("title", title),
            text("subject", subject),
            text("courseNumber", number),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", json);
    json["noteId"].as_str().unwrap().to_string()
}

fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect()
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = memory_app();
    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// -- Upload ---------------------------------------------------------------

#[tokio::test]
async fn upload_then_get_returns_submitted_fields() {
    let app = memory_app();
    let (status, json) = post_note(
        &app,
        &[
            file("lecture1.pdf", b"%PDF-1.4 lecture"),
            text("title", "Limits"),
            text("subject", "Math"),
            text("courseNumber", "MATH101"),
            text("description", "First lecture"),
            text("uploadedBy", "sam"),
            text("fileSize", "16 B"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    let id = json["noteId"].as_str().unwrap();

    let (status, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["id"], id);
    assert_eq!(note["title"], "Limits");
    assert_eq!(note["subject"], "Math");
    assert_eq!(note["number"], "MATH101");
    assert_eq!(note["description"], "First lecture");
    assert_eq!(note["uploadedBy"], "sam");
    assert_eq!(note["fileName"], "lecture1.pdf");
    assert_eq!(note["fileSize"], "16 B");
    assert_eq!(note["downloadCount"], 0);
    assert!(note["fileId"].as_str().is_some());
    assert!(note["uploadDate"].as_str().is_some());
}

#[tokio::test]
async fn upload_defaults_optional_fields() {
    let app = memory_app();
    let (status, json) = post_note(&app, &[file("a.png", b"png")]).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = json["noteId"].as_str().unwrap();
    let (_, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(note["uploadedBy"], "Anonymous");
    assert_eq!(note["description"], "");
    assert_eq!(note["fileSize"], "");
    assert_eq!(note["number"], Value::Null);
}

#[tokio::test]
async fn upload_accepts_uppercase_extension() {
    let app = memory_app();
    let (status, _) = post_note(&app, &[file("report.PDF", b"pdf")]).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn upload_rejects_disallowed_types_without_storing() {
    let app = memory_app();

    for name in ["virus.exe", "README", "archive.pdf.zip"] {
        let (status, json) = post_note(&app, &[file(name, b"data")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} should be rejected", name);
        assert_eq!(json["error"], "File type not allowed");
    }

    let (_, list) = get_json(&app, "/api/notes").await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let app = memory_app();
    let (status, json) = post_note(&app, &[text("title", "No file")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn upload_with_empty_filename_is_rejected() {
    let app = memory_app();
    let (status, json) = post_note(&app, &[file("", b"data")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No selected file");
}

#[tokio::test]
async fn upload_sanitizes_path_in_filename() {
    let app = memory_app();
    let (status, json) = post_note(&app, &[file("../../etc/my notes.docx", b"doc")]).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = json["noteId"].as_str().unwrap();
    let (_, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(note["fileName"], "my_notes.docx");
}

#[tokio::test]
async fn upload_removes_unsafe_characters_from_filename() {
    let app = memory_app();
    let (status, json) = post_note(&app, &[file("my notes (final).pdf", b"pdf")]).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = json["noteId"].as_str().unwrap();
    let (_, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(note["fileName"], "my_notes_final.pdf");
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let notes = Arc::new(MemoryNoteRepository::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let config = ApiConfig {
        max_upload_size: 1024,
        ..test_config()
    };
    let app = app_with(notes.clone(), blobs.clone(), &config);

    let big = vec![b'x'; 4096];
    let (status, _) = post_note(&app, &[file("big.pdf", &big)]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(notes.is_empty().await);
    assert!(blobs.is_empty().await);
}

// -- Listing and search ---------------------------------------------------

#[tokio::test]
async fn list_is_newest_first() {
    let app = memory_app();
    create(&app, "first", "Math", "M1").await;
    create(&app, "second", "Math", "M2").await;
    create(&app, "third", "CS", "C1").await;

    let (status, list) = get_json(&app, "/api/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["third", "second", "first"]);
}

#[tokio::test]
async fn search_matches_title_subject_and_number_case_insensitively() {
    let app = memory_app();
    create(&app, "Calculus Notes", "Math", "MATH101").await;
    create(&app, "Graphs", "CS", "CS201").await;
    create(&app, "Essay", "English", "ENG1").await;

    let (_, list) = get_json(&app, "/api/notes?search=calc").await;
    assert_eq!(titles(&list), vec!["Calculus Notes"]);

    let (_, list) = get_json(&app, "/api/notes?search=cs2").await;
    assert_eq!(titles(&list), vec!["Graphs"]);

    let (_, list) = get_json(&app, "/api/notes?search=engl").await;
    assert_eq!(titles(&list), vec!["Essay"]);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let app = memory_app();
    create(&app, "100% done", "Math", "M1").await;
    create(&app, "Other", "Math", "M2").await;

    let (_, list) = get_json(&app, "/api/notes?search=%25").await;
    assert_eq!(titles(&list), vec!["100% done"]);

    let (_, list) = get_json(&app, "/api/notes?search=.*").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn subject_filter_is_exact_and_combines_with_search() {
    let app = memory_app();
    create(&app, "Intro", "Math", "M1").await;
    create(&app, "Intro", "CS", "C1").await;
    create(&app, "Advanced", "Math", "M2").await;

    let (_, list) = get_json(&app, "/api/notes?subject=Math").await;
    assert_eq!(titles(&list), vec!["Advanced", "Intro"]);

    let (_, list) = get_json(&app, "/api/notes?subject=math").await;
    assert!(list.as_array().unwrap().is_empty());

    let (_, list) = get_json(&app, "/api/notes?subject=CS&search=intro").await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["subject"], "CS");
}

#[tokio::test]
async fn empty_query_parameters_are_ignored() {
    let app = memory_app();
    create(&app, "One", "Math", "M1").await;
    create(&app, "Two", "CS", "C1").await;

    let (_, list) = get_json(&app, "/api/notes?search=&subject=").await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// -- Get ------------------------------------------------------------------

#[tokio::test]
async fn get_unknown_id_is_404() {
    let app = memory_app();
    let (status, json) = get_json(&app, &format!("/api/notes/{}", Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Note not found");
}

#[tokio::test]
async fn get_malformed_id_is_500() {
    let app = memory_app();
    let (status, json) = get_json(&app, "/api/notes/not-an-id").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().is_some());
}

// -- Download -------------------------------------------------------------

#[tokio::test]
async fn download_returns_bytes_and_counts_each_request() {
    let app = memory_app();
    let content: &[u8] = b"%PDF-1.4 \x00\x01\x02 binary payload";
    let (_, json) = post_note(&app, &[file("week 3.pdf", content)]).await;
    let id = json["noteId"].as_str().unwrap().to_string();

    for _ in 0..3 {
        let req = Request::builder()
            .uri(format!("/api/notes/download/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"week_3.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], content);
    }

    let (_, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(note["downloadCount"], 3);
}

#[tokio::test]
async fn download_unknown_id_is_404() {
    let app = memory_app();
    let (status, _) = get_json(&app, &format!("/api/notes/download/{}", Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_malformed_id_is_500() {
    let app = memory_app();
    let (status, _) = get_json(&app, "/api/notes/download/12345").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// -- Subjects -------------------------------------------------------------

#[tokio::test]
async fn subjects_are_distinct() {
    let app = memory_app();
    let (status, list) = get_json(&app, "/api/subjects").await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    create(&app, "a", "Math", "M1").await;
    create(&app, "b", "CS", "C1").await;
    create(&app, "c", "Math", "M2").await;

    let (_, list) = get_json(&app, "/api/subjects").await;
    let mut subjects: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    subjects.sort_unstable();
    assert_eq!(subjects, vec!["CS", "Math"]);
}

// -- Store failures -------------------------------------------------------

struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, _data: &[u8], _name: &str) -> noteshare_core::Result<Uuid> {
        Err(Error::Storage("blob store offline".to_string()))
    }

    async fn get(&self, _id: Uuid) -> noteshare_core::Result<Option<StoredBlob>> {
        Err(Error::Storage("blob store offline".to_string()))
    }
}

struct FailingNoteRepository;

#[async_trait]
impl NoteRepository for FailingNoteRepository {
    async fn find(&self, _filter: &NoteFilter) -> noteshare_core::Result<Vec<Note>> {
        Err(Error::Storage("note store offline".to_string()))
    }

    async fn find_by_id(&self, _id: Uuid) -> noteshare_core::Result<Option<Note>> {
        Err(Error::Storage("note store offline".to_string()))
    }

    async fn insert(&self, _note: NewNote) -> noteshare_core::Result<Uuid> {
        Err(Error::Storage("note store offline".to_string()))
    }

    async fn increment_download_count(&self, _id: Uuid) -> noteshare_core::Result<bool> {
        Err(Error::Storage("note store offline".to_string()))
    }

    async fn distinct_subjects(&self) -> noteshare_core::Result<Vec<String>> {
        Err(Error::Storage("note store offline".to_string()))
    }
}

#[tokio::test]
async fn blob_store_failure_is_500_with_message() {
    let notes = Arc::new(MemoryNoteRepository::new());
    let app = app_with(notes.clone(), Arc::new(FailingBlobStore), &test_config());

    let (status, json) = post_note(&app, &[file("a.pdf", b"pdf")]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("blob store offline"));
    assert!(notes.is_empty().await);
}

#[tokio::test]
async fn note_store_failure_is_500_on_every_route() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let app = app_with(Arc::new(FailingNoteRepository), blobs.clone(), &test_config());

    let id = Uuid::now_v7();
    for uri in [
        "/api/notes".to_string(),
        format!("/api/notes/{}", id),
        format!("/api/notes/download/{}", id),
        "/api/subjects".to_string(),
    ] {
        let (status, json) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("note store offline"));
    }

    let (status, _) = post_note(&app, &[file("a.pdf", b"pdf")]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The blob was written before the insert failed and is left in place
    assert_eq!(blobs.len().await, 1);
}

/// Stores blobs normally but fails every read.
struct UnreadableBlobStore(MemoryBlobStore);

#[async_trait]
impl BlobStore for UnreadableBlobStore {
    async fn put(&self, data: &[u8], name: &str) -> noteshare_core::Result<Uuid> {
        self.0.put(data, name).await
    }

    async fn get(&self, _id: Uuid) -> noteshare_core::Result<Option<StoredBlob>> {
        Err(Error::Storage("blob read failed".to_string()))
    }
}

#[tokio::test]
async fn failed_blob_read_still_counts_the_download() {
    let app = app_with(
        Arc::new(MemoryNoteRepository::new()),
        Arc::new(UnreadableBlobStore(MemoryBlobStore::new())),
        &test_config(),
    );
    let (_, json) = post_note(&app, &[file("a.pdf", b"pdf")]).await;
    let id = json["noteId"].as_str().unwrap().to_string();

    let (status, json) = get_json(&app, &format!("/api/notes/download/{}", id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("blob read failed"));

    let (_, note) = get_json(&app, &format!("/api/notes/{}", id)).await;
    assert_eq!(note["downloadCount"], 1);
}
