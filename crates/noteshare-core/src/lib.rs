//! # noteshare-core
//!
//! Core types, traits, and abstractions for the noteshare backend.
//!
//! This crate provides the note record, the typed list filter, and the
//! storage traits that the database layer and the HTTP API depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{file_extension, is_allowed_extension, sanitize_filename};
pub use models::*;
pub use traits::*;
