//! Repository for the `photos` table.

use sqlx::PgPool;

use gala_core::types::DbId;

use crate::models::photo::{CreatePhoto, Photo};

/// Column list for `photos` queries.
const COLUMNS: &str = "\
    id, event_id, original_path, display_path, thumbnail_path, \
    file_name, size_bytes, width, height, display_order, created_at";

/// Provides catalog operations for processed photos.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Insert a new photo row.
    ///
    /// `display_order` is assigned inside the statement from the current
    /// per-event maximum, so concurrent inserts serialize on the database
    /// rather than racing on a value read earlier by the caller.
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos \
                 (event_id, original_path, display_path, thumbnail_path, \
                  file_name, size_bytes, width, height, display_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                 (SELECT COALESCE(MAX(display_order), 0) + 1 FROM photos WHERE event_id = $1)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(input.event_id)
            .bind(&input.original_path)
            .bind(&input.display_path)
            .bind(&input.thumbnail_path)
            .bind(&input.file_name)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .fetch_one(pool)
            .await
    }

    /// Find a photo by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an event's photos in display order.
    pub async fn list_by_event(pool: &PgPool, event_id: DbId) -> Result<Vec<Photo>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM photos WHERE event_id = $1 ORDER BY display_order ASC");
        sqlx::query_as::<_, Photo>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }
}
