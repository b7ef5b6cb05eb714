use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::file::{FileRecord, NewFileRecord};

/// Append-only store of uploaded file metadata.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persists a record, stamping `file_id` and `created_at`.
    async fn insert(&self, new_file: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Newest record by `created_at`; later insertions win ties.
    async fn most_recent(&self) -> Result<Option<FileRecord>, AppError>;

    async fn find(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<FileRecord>, AppError>;
}

const FILE_COLUMNS: &str = "file_id, file_name, file_path, mime_type, created_at";

#[derive(Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        let store = PgFileStore { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                seq BIGSERIAL,
                file_id UUID PRIMARY KEY,
                file_name TEXT NOT NULL UNIQUE,
                file_path TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS files_created_at_idx ON files (created_at DESC, seq DESC)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn insert(&self, new_file: NewFileRecord) -> Result<FileRecord, AppError> {
        let sql = format!(
            "INSERT INTO files (file_id, file_name, file_path, mime_type, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {}",
            FILE_COLUMNS
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_file.file_name)
            .bind(&new_file.file_path)
            .bind(&new_file.mime_type)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn most_recent(&self) -> Result<Option<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM files ORDER BY created_at DESC, seq DESC LIMIT 1",
            FILE_COLUMNS
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM files WHERE file_id = $1", FILE_COLUMNS);
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM files ORDER BY created_at ASC, seq ASC", FILE_COLUMNS);
        let records = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
