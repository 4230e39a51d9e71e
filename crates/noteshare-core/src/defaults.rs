//! Centralized default constants for noteshare.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers. Environment overrides are read by the API config layer.

// =============================================================================
// HTTP
// =============================================================================

/// Common prefix for all note routes.
pub const API_PREFIX: &str = "/api";

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 5000;

// =============================================================================
// DATABASE
// =============================================================================

/// Placeholder connection string used when `DATABASE_URL` is unset.
/// Does not point at a real deployment; the pool connects lazily.
pub const DATABASE_URL: &str = "postgres://localhost/noteshare";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum request body size for uploads (10 MiB).
/// Configurable via `MAX_UPLOAD_SIZE_BYTES`.
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Lower-cased file extensions accepted by the create operation.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Maximum stored filename length (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;

/// Filename used when sanitization leaves nothing behind.
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Uploader recorded when the form omits `uploadedBy`.
pub const DEFAULT_UPLOADER: &str = "Anonymous";

// =============================================================================
// BLOB STORAGE
// =============================================================================

/// Size of each stored blob chunk in bytes (255 KiB).
pub const BLOB_CHUNK_SIZE: usize = 255 * 1024;
