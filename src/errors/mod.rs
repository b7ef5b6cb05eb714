use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Upload(String),
    #[error("File exceeds the {0} byte upload limit")]
    PayloadTooLarge(usize),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("File read error: {0}")]
    FileRead(#[source] std::io::Error),
    #[error("Database error")]
    Database(#[source] sqlx::Error),
    #[error("Generation failed")]
    Generation(String),
    #[error("Something went wrong")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upload(_)
            | AppError::FileRead(_)
            | AppError::Database(_)
            | AppError::Generation(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Generation(detail) = self {
            log::error!("Generation API error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: self.to_string() })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("Database error: {:?}", err);
        AppError::Database(err)
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::Upload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[actix_web::test]
    async fn database_details_stay_server_side() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(err).await["error"], "Database error");
    }

    #[actix_web::test]
    async fn file_read_error_carries_io_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let body = body_json(AppError::FileRead(io)).await;
        assert_eq!(body["error"], "File read error: gone");
    }

    #[actix_web::test]
    async fn generation_failure_is_a_generic_server_error() {
        let err = AppError::Generation("API returned 429: quota exceeded".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(err).await["error"], "Generation failed");
    }

    #[actix_web::test]
    async fn internal_error_uses_fixed_message() {
        let err = AppError::Internal;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(err).await["error"], "Something went wrong");
    }
}
