//! Repository for the `batch_files` table.

use sqlx::PgConnection;

use presshub_core::types::DbId;

use crate::models::file::BatchFile;

/// Column list for `batch_files` queries.
const COLUMNS: &str = "id, batch_id, name, mime_type, size_bytes, created_at";

/// Provides design-attachment metadata operations.
pub struct BatchFileRepo;

impl BatchFileRepo {
    /// Number of design files attached to a batch. The auto-status
    /// engine only consumes this as a presence signal.
    pub async fn count_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM batch_files WHERE batch_id = $1")
                .bind(batch_id)
                .fetch_one(conn)
                .await?;
        Ok(count)
    }

    /// All files attached to a batch, newest first.
    pub async fn list_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<Vec<BatchFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batch_files WHERE batch_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, BatchFile>(&query)
            .bind(batch_id)
            .fetch_all(conn)
            .await
    }

    /// Record an uploaded design file.
    pub async fn create(
        conn: &mut PgConnection,
        batch_id: DbId,
        name: &str,
        mime_type: Option<&str>,
        size_bytes: Option<i64>,
    ) -> Result<BatchFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO batch_files (batch_id, name, mime_type, size_bytes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BatchFile>(&query)
            .bind(batch_id)
            .bind(name)
            .bind(mime_type)
            .bind(size_bytes)
            .fetch_one(conn)
            .await
    }
}
