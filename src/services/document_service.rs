use std::path::{Path, PathBuf};

use axum::{
    extract::{
        Multipart,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    dto::documents::DocumentUploaded,
    error::{AppError, AppResult},
    models::UploadedDocument,
    response::ApiResponse,
    state::AppState,
};

/// Largest accepted supporting document, 3 MiB.
pub const MAX_DOCUMENT_BYTES: u64 = 3 * 1024 * 1024;

/// Request body limit for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_DOCUMENT_BYTES as usize + 64 * 1024;

pub const DOCUMENT_FIELD: &str = "document";

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge
    } else {
        tracing::warn!(error = %err, "multipart upload failed");
        AppError::BadRequest("Error while uploading the file".into())
    }
}

/// `document-<millis>-<uuid>.<ext>`; only short alphanumeric extensions are
/// kept from the client's file name.
pub fn generated_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!(
        "{DOCUMENT_FIELD}-{}-{}{extension}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %err, "could not remove partial upload");
    }
}

async fn write_field(path: &Path, field: &mut Field<'_>) -> AppResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > MAX_DOCUMENT_BYTES {
            return Err(AppError::FileTooLarge);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(size)
}

async fn store_field(upload_dir: &Path, field: &mut Field<'_>) -> AppResult<UploadedDocument> {
    let original_name = field.file_name().unwrap_or(DOCUMENT_FIELD).to_string();
    tokio::fs::create_dir_all(upload_dir).await?;

    let filename = generated_filename(&original_name);
    let path: PathBuf = upload_dir.join(&filename);

    let size = match write_field(&path, field).await {
        Ok(size) => size,
        Err(err) => {
            discard(&path).await;
            return Err(err);
        }
    };

    Ok(UploadedDocument {
        original_name,
        filename,
        path: path.display().to_string(),
        size,
        uploaded_at: Utc::now(),
    })
}

/// Stores the single file sent in the `document` field. Other fields are
/// ignored; a second file rejects the whole upload.
pub async fn upload_document(
    state: &AppState,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<DocumentUploaded>> {
    let upload_dir = &state.config.upload_dir;
    let mut stored: Option<UploadedDocument> = None;

    loop {
        let next = multipart.next_field().await;
        let mut field = match next {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                if let Some(doc) = &stored {
                    discard(&upload_dir.join(&doc.filename)).await;
                }
                return Err(multipart_error(err));
            }
        };

        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }
        if let Some(doc) = &stored {
            discard(&upload_dir.join(&doc.filename)).await;
            return Err(AppError::BadRequest("Only one file may be uploaded".into()));
        }
        stored = Some(store_field(upload_dir, &mut field).await?);
    }

    let file = stored.ok_or_else(|| AppError::BadRequest("No file received".into()))?;

    tracing::info!(
        filename = %file.filename,
        original_name = %file.original_name,
        size = file.size,
        "document uploaded"
    );

    Ok(ApiResponse::success(
        "File uploaded",
        DocumentUploaded { file },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_extensions_only() {
        let name = generated_filename("Ordonnance.PDF");
        assert!(name.starts_with("document-"));
        assert!(name.ends_with(".pdf"));

        assert!(!generated_filename("../../etc/passwd").contains('.'));
        assert!(!generated_filename("scan.p$f").contains('$'));
    }

    #[test]
    fn generated_names_are_unique() {
        assert_ne!(generated_filename("a.png"), generated_filename("a.png"));
    }
}
