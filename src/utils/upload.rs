use std::path::PathBuf;

use actix_multipart::{Field, Multipart};
use actix_web::web;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::AppError;

/// Multipart field carrying the avatar image.
pub const AVATAR_FIELD: &str = "avatar";
pub const ALLOWED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Debug)]
pub struct UploadedImage {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An image written to the upload directory.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoredFile {
    #[schema(example = "2026-01-01T08-30-00.000Zbudi.png")]
    pub filename: String,
    #[schema(example = "budi.png")]
    pub original_name: String,
    #[schema(example = "public/uploads/images/2026-01-01T08-30-00.000Zbudi.png")]
    pub path: String,
    #[schema(example = "image/png")]
    pub mimetype: String,
    #[schema(example = 52341)]
    pub size: usize,
}

async fn drain(field: &mut Field) -> Result<(), AppError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
    }
    Ok(())
}

/// Reads the first file part named `field_name`.
///
/// The MIME type is checked before any bytes are buffered, and reading stops
/// as soon as the part grows past `max_bytes`. Returns `None` when the form
/// carries no such file.
pub async fn read_image(
    mut payload: Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<Option<UploadedImage>, AppError> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;

        let disposition = field.content_disposition();
        let wanted = match (disposition.get_name(), disposition.get_filename()) {
            (Some(name), Some(filename)) if name == field_name => Some(filename.to_string()),
            _ => None,
        };

        let Some(original_name) = wanted else {
            drain(&mut field).await?;
            continue;
        };

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(
                "Only JPEG and PNG images are allowed".into(),
            ));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;

            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "File too large, limit is {max_bytes} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(original_name = %original_name, content_type = %content_type, size = bytes.len(), "Received image upload");

        return Ok(Some(UploadedImage {
            original_name,
            content_type,
            bytes,
        }));
    }

    Ok(None)
}

/// Keeps only the final path component and a conservative character set.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Upload time prefix plus the sanitized original name.
pub fn stored_file_name(at: DateTime<Utc>, original: &str) -> String {
    format!(
        "{}{}",
        at.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
        sanitize_file_name(original)
    )
}

pub async fn store_image(dir: &str, image: UploadedImage) -> Result<StoredFile, AppError> {
    let filename = stored_file_name(Utc::now(), &image.original_name);
    let dir = PathBuf::from(dir);
    let path = dir.join(&filename);
    let size = image.bytes.len();

    let target = path.clone();
    web::block(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&target, &image.bytes)
    })
    .await??;

    Ok(StoredFile {
        filename,
        original_name: image.original_name,
        path: path.to_string_lossy().into_owned(),
        mimetype: image.content_type,
        size,
    })
}

/// Best-effort delete of a stored upload; an already missing file is fine.
pub async fn remove_stored(path: &str) {
    let target = PathBuf::from(path);
    let result = web::block(move || match std::fs::remove_file(&target) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    })
    .await;

    match result {
        Ok(Ok(())) => debug!(path, "Removed stored file"),
        Ok(Err(e)) => warn!(path, error = %e, "Failed to remove stored file"),
        Err(e) => warn!(path, error = %e, "Failed to remove stored file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\me.png"), "me.png");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[test]
    fn stored_names_are_timestamp_prefixed() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            stored_file_name(at, "budi.png"),
            "2026-01-02T03-04-05.000Zbudi.png"
        );
    }

    #[actix_web::test]
    async fn store_image_writes_into_the_upload_dir() {
        let dir = std::env::temp_dir().join(format!("cuti-api-upload-{}", uuid::Uuid::new_v4()));
        let dir_str = dir.to_string_lossy().into_owned();

        let stored = store_image(
            &dir_str,
            UploadedImage {
                original_name: "budi.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
        )
        .await
        .unwrap();

        assert!(stored.filename.ends_with("budi.png"));
        assert_eq!(stored.size, 3);
        assert_eq!(std::fs::read(&stored.path).unwrap(), vec![1, 2, 3]);

        remove_stored(&stored.path).await;
        assert!(!std::path::Path::new(&stored.path).exists());

        // removing twice is not an error
        remove_stored(&stored.path).await;

        std::fs::remove_dir_all(dir).ok();
    }
}
