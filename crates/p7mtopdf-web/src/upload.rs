use axum::extract::Multipart;
use p7mtopdf_core::Config;
use p7mtopdf_ingest::{has_zip_magic, is_archive_name};

/// The type of uploaded file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// A single signed container.
    Container,
    Zip,
}

/// An uploaded file with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
    pub file_type: FileType,
}

/// Parse a multipart form upload, returning the `file` field.
pub async fn parse_multipart(
    mut multipart: Multipart,
    config: &Config,
) -> Result<UploadedFile, String> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();

                let file_type = detect_file_type(&filename, &data, config)?;

                file = Some(UploadedFile {
                    filename,
                    data,
                    file_type,
                });
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    file.ok_or_else(|| "No file uploaded".to_string())
}

/// Detect file type from extension, falling back to magic bytes.
pub fn detect_file_type(filename: &str, data: &[u8], config: &Config) -> Result<FileType, String> {
    if is_archive_name(filename) {
        return Ok(FileType::Zip);
    }
    if config.is_eligible(filename) {
        return Ok(FileType::Container);
    }
    if has_zip_magic(data) {
        return Ok(FileType::Zip);
    }

    Err(format!(
        "Unsupported file type. Please upload a {} file or a ZIP archive.",
        config.container_suffix
    ))
}
