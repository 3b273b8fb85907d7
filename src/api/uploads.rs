//! Storage for uploaded images.
//!
//! Files land under `<data_dir>/uploads/` with UUID names and are served
//! back under the fixed `/uploads` prefix.

use std::path::Path;

use super::error::ApiError;

pub const UPLOADS_URL_PREFIX: &str = "/uploads";
pub const UPLOADS_DIR: &str = "uploads";

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Persist one uploaded file and return its public URL path.
pub async fn store_file(
    data_dir: &Path,
    original_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::bad_request("Uploaded file is too large (max 5 MB)"));
    }

    let ext = extension_for(original_name, content_type);
    let filename = match ext {
        Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
        None => uuid::Uuid::new_v4().to_string(),
    };

    let dir = data_dir.join(UPLOADS_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {}", e)))?;
    tokio::fs::write(dir.join(&filename), bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;

    Ok(format!("{}/{}", UPLOADS_URL_PREFIX, filename))
}

/// Pick a file extension from the client filename, falling back to the
/// declared content type.
fn extension_for(original_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    if let Some(name) = original_name {
        if let Some((_, ext)) = name.rsplit_once('.') {
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Some(ext.to_ascii_lowercase());
            }
        }
    }
    content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
}
