//! Note repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use noteshare_core::{NewNote, Note, NoteFilter, NoteRepository, Result};

use crate::escape_like;

const NOTE_COLUMNS: &str = "id, title, subject, number, description, uploaded_by, upload_date, \
                            file_name, file_id, file_size, download_count";

/// Generates the WHERE clause for a [`NoteFilter`].
///
/// Free-text matching uses `ILIKE` with wildcard characters escaped, so
/// user input is always matched as a literal substring.
///
/// ```rust,ignore
/// let filter = NoteFilter::new().search(Some("algebra")).subject(Some("Math"));
/// let (sql, params) = NoteFilterQueryBuilder::new(&filter, 0).build();
/// // sql: "(title ILIKE '%' || $1 || '%' ESCAPE '\' OR ...) AND subject = $2"
/// // params: ["algebra", "Math"]
/// ```
pub struct NoteFilterQueryBuilder<'a> {
    filter: &'a NoteFilter,
    param_offset: usize,
}

impl<'a> NoteFilterQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already bound in the query.
    pub fn new(filter: &'a NoteFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Build the clause and its parameters in binding order.
    ///
    /// An empty filter yields `("TRUE", [])`.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut idx = self.param_offset;

        if let Some(query) = &self.filter.search {
            idx += 1;
            clauses.push(format!(
                "(title ILIKE '%' || ${idx} || '%' ESCAPE '\\' \
                 OR subject ILIKE '%' || ${idx} || '%' ESCAPE '\\' \
                 OR number ILIKE '%' || ${idx} || '%' ESCAPE '\\')"
            ));
            params.push(escape_like(query));
        }

        if let Some(subject) = &self.filter.subject {
            idx += 1;
            clauses.push(format!("subject = ${}", idx));
            params.push(subject.clone());
        }

        if clauses.is_empty() {
            ("TRUE".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Number of stored notes. Used by the setup routine to decide on seeding.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM note")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let (clause, params) = NoteFilterQueryBuilder::new(filter, 0).build();
        // UUIDv7 ids break ties between identical upload timestamps
        let sql = format!(
            "SELECT {} FROM note WHERE {} ORDER BY upload_date DESC, id DESC",
            NOTE_COLUMNS, clause
        );

        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "find",
            result_count = rows.len(),
            "Listed notes"
        );
        rows.iter().map(note_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        let sql = format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| note_from_row(&row))
            .transpose()
    }

    async fn insert(&self, note: NewNote) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO note
               (id, title, subject, number, description, uploaded_by, upload_date,
                file_name, file_id, file_size, download_count)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0)"#,
        )
        .bind(id)
        .bind(&note.title)
        .bind(&note.subject)
        .bind(&note.number)
        .bind(&note.description)
        .bind(&note.uploaded_by)
        .bind(note.upload_date)
        .bind(&note.file_name)
        .bind(note.file_id)
        .bind(&note.file_size)
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "insert",
            note_id = %id,
            blob_id = %note.file_id,
            "Inserted note"
        );
        Ok(id)
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<bool> {
        // Single-statement increment; concurrent downloads never lose updates
        let result =
            sqlx::query("UPDATE note SET download_count = download_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn distinct_subjects(&self) -> Result<Vec<String>> {
        let subjects = sqlx::query_scalar::<_, String>("SELECT DISTINCT subject FROM note")
            .fetch_all(&self.pool)
            .await?;
        Ok(subjects)
    }
}

/// Convert a database row to a Note.
fn note_from_row(row: &sqlx::postgres::PgRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        subject: row.try_get("subject")?,
        number: row.try_get("number")?,
        description: row.try_get("description")?,
        uploaded_by: row.try_get("uploaded_by")?,
        upload_date: row.try_get("upload_date")?,
        file_name: row.try_get("file_name")?,
        file_id: row.try_get("file_id")?,
        file_size: row.try_get("file_size")?,
        download_count: row.try_get("download_count")?,
    })
}
