use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::{FutureExt as _, TryStreamExt as _};
use serde::Serialize;
use std::panic::AssertUnwindSafe;

use crate::config::Config;
use crate::db::FileStore;
use crate::errors::AppError;
use crate::models::file::{FileRecord, NewFileRecord};
use crate::utils::storage::{self, StoredUpload};

const FILE_FIELD: &str = "file";

#[derive(Serialize)]
struct FileUploadResponse {
    message: &'static str,
    file: FileRecord,
}

pub async fn upload_file(
    cfg: web::Data<Config>,
    store: web::Data<dyn FileStore>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    match AssertUnwindSafe(receive_upload(&cfg, store.get_ref(), payload))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            log::error!("Upload handler panicked: {}", reason);
            Err(AppError::Internal)
        }
    }
}

async fn receive_upload(
    cfg: &Config,
    store: &dyn FileStore,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut stored: Option<StoredUpload> = None;

    while let Some(mut field) = payload.try_next().await? {
        let disposition = field.content_disposition();
        let is_file = disposition.get_filename().is_some();
        let field_name = disposition.get_name().unwrap_or_default().to_string();

        // Plain text fields are skipped
        if !is_file {
            while field.try_next().await?.is_some() {}
            continue;
        }

        // Only a single file, under the `file` field
        if field_name != FILE_FIELD || stored.is_some() {
            return Err(AppError::Upload(format!("Unexpected field: {}", field_name)));
        }

        // Write it under a generated unique name
        stored = Some(storage::save_field(&cfg.upload_dir, &field_name, field, cfg.max_upload_bytes).await?);
    }

    let stored = stored.ok_or_else(|| AppError::Upload("No file uploaded".to_string()))?;

    // Store the file metadata
    let record = store
        .insert(NewFileRecord {
            file_name: stored.file_name,
            file_path: stored.path.to_string_lossy().into_owned(),
            mime_type: stored.mime_type,
        })
        .await?;
    log::info!("Stored {} ({}) as {}", record.file_name, record.mime_type, record.file_id);

    Ok(HttpResponse::Ok().json(FileUploadResponse {
        message: "File uploaded and metadata saved successfully",
        file: record,
    }))
}

pub async fn list_files(store: web::Data<dyn FileStore>) -> Result<HttpResponse, AppError> {
    let files = store.list().await?;
    Ok(HttpResponse::Ok().json(files))
}
