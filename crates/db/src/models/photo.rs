//! Photo catalog entity model and DTOs.

use gala_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `photos` table. Created once by the artifact writer on
/// full success of all three uploads plus the catalog insert; never
/// mutated afterward.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub event_id: DbId,
    pub original_path: String,
    pub display_path: String,
    pub thumbnail_path: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub display_order: i32,
    pub created_at: Timestamp,
}

/// DTO for inserting a new photo row.
///
/// `display_order` is assigned atomically by the insert itself and is
/// deliberately absent here.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoto {
    pub event_id: DbId,
    pub original_path: String,
    pub display_path: String,
    pub thumbnail_path: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
}
