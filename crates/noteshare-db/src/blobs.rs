//! Chunked blob storage in PostgreSQL.
//!
//! Each blob is one `blob_file` row (name, total length, chunk size) plus
//! ordered `blob_chunk` rows holding the payload in fixed-size pieces, so
//! no single row has to carry a whole upload.
//!
//! ## Example
//!
//! ```rust,ignore
//! use noteshare_db::PgBlobStore;
//!
//! let blobs = PgBlobStore::new(pool);
//! let id = blobs.put(&data, "lecture-3.pdf").await?;
//! let blob = blobs.get(id).await?.expect("just stored");
//! ```

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use noteshare_core::defaults::BLOB_CHUNK_SIZE;
use noteshare_core::{BlobStore, Error, Result, StoredBlob};

/// PostgreSQL chunked blob store.
#[derive(Clone)]
pub struct PgBlobStore {
    pool: PgPool,
    chunk_size: usize,
}

impl PgBlobStore {
    /// Create a blob store using the default chunk size.
    pub fn new(pool: PgPool) -> Self {
        Self::with_chunk_size(pool, BLOB_CHUNK_SIZE)
    }

    /// Create a blob store with a custom chunk size (clamped to at least 1 byte).
    pub fn with_chunk_size(pool: PgPool, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn put(&self, data: &[u8], name: &str) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO blob_file (id, file_name, length, chunk_size)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(id)
        .bind(name)
        .bind(data.len() as i64)
        .bind(self.chunk_size as i32)
        .execute(&mut *tx)
        .await?;

        for (n, chunk) in data.chunks(self.chunk_size).enumerate() {
            sqlx::query("INSERT INTO blob_chunk (file_id, n, data) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(n as i32)
                .bind(chunk)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            subsystem = "database",
            component = "blobs",
            op = "put",
            blob_id = %id,
            size = data.len(),
            "Stored blob"
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredBlob>> {
        let Some(file) = sqlx::query("SELECT file_name, length FROM blob_file WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let name: String = file.try_get("file_name")?;
        let length: i64 = file.try_get("length")?;

        let mut rows = sqlx::query("SELECT data FROM blob_chunk WHERE file_id = $1 ORDER BY n")
            .bind(id)
            .fetch(&self.pool);

        let mut data = Vec::with_capacity(length.max(0) as usize);
        let mut chunks = 0usize;
        while let Some(row) = rows.try_next().await? {
            let chunk: &[u8] = row.try_get("data")?;
            data.extend_from_slice(chunk);
            chunks += 1;
        }

        if data.len() as i64 != length {
            return Err(Error::Storage(format!(
                "blob {} is corrupt: expected {} bytes, read {}",
                id,
                length,
                data.len()
            )));
        }

        debug!(
            subsystem = "database",
            component = "blobs",
            op = "get",
            blob_id = %id,
            chunks,
            "Read blob"
        );
        Ok(Some(StoredBlob { name, data }))
    }
}
