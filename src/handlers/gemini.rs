use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::FileStore;
use crate::errors::AppError;
use crate::utils::gemini::{GenerativeModel, InlineFile};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    message: String,
    /// Pins the file to use; without it the newest upload is taken.
    file_id: Option<Uuid>,
}

pub async fn generate(
    store: web::Data<dyn FileStore>,
    model: web::Data<dyn GenerativeModel>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    // Pick the requested file, or the most recent upload
    let record = match body.file_id {
        Some(file_id) => store.find(file_id).await?,
        None => store.most_recent().await?,
    }
    .ok_or_else(|| AppError::NotFound("No file found".to_string()))?;

    // Read the file from disk
    let data = tokio::fs::read(&record.file_path).await.map_err(|err| {
        log::error!("Failed to read {}: {}", record.file_path, err);
        AppError::FileRead(err)
    })?;

    // Send prompt and file to the model
    let text = model
        .generate(
            &body.message,
            InlineFile {
                mime_type: record.mime_type.clone(),
                data,
            },
        )
        .await
        .map_err(AppError::Generation)?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text))
}
