use axum::extract::Multipart;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::error::ApiError;

pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Storage keys are millisecond-time-prefixed to avoid collisions between
/// uploads sharing a file name.
pub fn object_key(file_name: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}-{}", millis, file_name)
}

fn matches_field(name: Option<&str>, expected: &str) -> bool {
    match name {
        Some(n) => n == expected || n.strip_suffix("[]") == Some(expected),
        None => false,
    }
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<UploadFile, ApiError> {
    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "upload.bin".into());
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = field
        .bytes()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart body".into()))?;
    Ok(UploadFile {
        file_name,
        content_type,
        body,
    })
}

/// Pull the first file out of the named multipart field, if any.
pub async fn single_file(
    mp: &mut Multipart,
    field_name: &str,
) -> Result<Option<UploadFile>, ApiError> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart body".into()))?
    {
        if matches_field(field.name(), field_name) {
            return Ok(Some(read_file(field).await?));
        }
    }
    Ok(None)
}

/// Collect every file in the named multipart field, upload order preserved.
pub async fn collect_files(
    mp: &mut Multipart,
    field_name: &str,
    max: usize,
) -> Result<Vec<UploadFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart body".into()))?
    {
        if matches_field(field.name(), field_name) {
            if files.len() >= max {
                return Err(ApiError::BadRequest(format!(
                    "At most {max} files per upload"
                )));
            }
            files.push(read_file(field).await?);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_time_prefixed() {
        let key = object_key("photo.jpg");
        let (prefix, rest) = key.split_once('-').expect("dash separator");
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "photo.jpg");
    }

    #[test]
    fn field_name_matching_accepts_array_suffix() {
        assert!(matches_field(Some("portfolio"), "portfolio"));
        assert!(matches_field(Some("portfolio[]"), "portfolio"));
        assert!(!matches_field(Some("other"), "portfolio"));
        assert!(!matches_field(None, "portfolio"));
    }
}
