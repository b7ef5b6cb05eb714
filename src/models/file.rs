use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// A record as built by the upload path, before the store stamps it.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub file_name: String,
    pub file_path: String,
    pub mime_type: String,
}
