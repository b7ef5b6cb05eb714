use actix_multipart::Field;
use chrono::Utc;
use futures_util::TryStreamExt as _;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

const OCTET_STREAM: &str = "application/octet-stream";

/// A multipart field written to disk.
pub struct StoredUpload {
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: String,
}

/// `<field>-<unix millis>-<random below 1e9>`
pub fn unique_file_name(field_name: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}-{}", field_name, Utc::now().timestamp_millis(), suffix)
}

/// Streams a field into `dir`, enforcing `max_bytes`.
///
/// A partially written file is left behind if the stream fails midway.
pub async fn save_field(
    dir: &Path,
    field_name: &str,
    mut field: Field,
    max_bytes: usize,
) -> Result<StoredUpload, AppError> {
    let declared = field.content_type().map(|mime| mime.essence_str().to_string());
    let file_name = unique_file_name(field_name);
    let path = dir.join(&file_name);

    let mut file = File::create(&path)
        .await
        .map_err(|err| AppError::Upload(format!("Failed to create file: {}", err)))?;

    let mut written = 0usize;
    let mut head: Vec<u8> = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        written += chunk.len();
        if written > max_bytes {
            return Err(AppError::PayloadTooLarge(max_bytes));
        }
        if head.len() < 8192 {
            head.extend_from_slice(&chunk[..chunk.len().min(8192 - head.len())]);
        }
        file.write_all(&chunk)
            .await
            .map_err(|err| AppError::Upload(format!("Failed to write file: {}", err)))?;
    }
    file.flush()
        .await
        .map_err(|err| AppError::Upload(format!("Failed to write file: {}", err)))?;

    Ok(StoredUpload {
        file_name,
        path,
        mime_type: resolve_mime(declared, &head),
    })
}

/// The client-declared type is kept as-is; bytes are sniffed only when none was declared.
pub fn resolve_mime(declared: Option<String>, head: &[u8]) -> String {
    match declared {
        Some(mime) => mime,
        None => infer::get(head)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_field_time_random_pattern() {
        let name = unique_file_name("file");
        let parts: Vec<&str> = name.splitn(3, '-').collect();

        assert_eq!(parts[0], "file");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[test]
    fn repeated_names_differ() {
        let names: std::collections::HashSet<String> = (0..100).map(|_| unique_file_name("file")).collect();
        assert_eq!(names.len(), 100);
    }

    #[test]
    fn declared_type_is_kept() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(resolve_mime(Some("text/plain".into()), &png_magic), "text/plain");
    }

    #[test]
    fn declared_octet_stream_is_not_overridden() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(resolve_mime(Some(OCTET_STREAM.into()), &png_magic), OCTET_STREAM);
    }

    #[test]
    fn undeclared_type_is_sniffed() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(resolve_mime(None, &png_magic), "image/png");
        assert_eq!(resolve_mime(None, b"plain words"), OCTET_STREAM);
    }
}
