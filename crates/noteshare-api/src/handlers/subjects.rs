//! Subject listing handler.

use axum::extract::State;
use axum::Json;

use crate::{ApiError, AppState};

/// List the distinct subjects present across all notes.
///
/// # Returns
/// - 200 OK with an array of strings, in no particular order
/// - 500 Internal Server Error if the store fails
pub async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let subjects = state.notes.list_subjects().await?;
    Ok(Json(subjects))
}
