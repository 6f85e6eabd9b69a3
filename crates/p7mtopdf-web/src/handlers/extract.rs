use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use p7mtopdf_ingest::{BatchError, OUTPUT_ARCHIVE_NAME};

use crate::models::{ApiError, attachment, warnings_header};
use crate::state::AppState;
use crate::upload::{self, FileType, UploadedFile};

/// Header carrying the per-entry warnings of a bulk extraction (JSON array,
/// truncated to [`MAX_WARNINGS_HEADER_BYTES`]).
pub const WARNINGS_HEADER: &str = "x-extraction-warnings";
/// Header carrying the number of warnings before truncation.
pub const WARNINGS_TOTAL_HEADER: &str = "x-extraction-warnings-total";
pub const MAX_WARNINGS_HEADER_BYTES: usize = 4096;
/// Header carrying the number of PDFs in the returned archive.
pub const COUNT_HEADER: &str = "x-extracted-count";

pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let file = upload::parse_multipart(multipart, &state.config)
        .await
        .map_err(ApiError::bad_request)?;

    tracing::info!(
        filename = %file.filename,
        bytes = file.data.len(),
        kind = ?file.file_type,
        "received upload"
    );

    match file.file_type {
        FileType::Zip => extract_archive(state, file).await,
        FileType::Container => extract_single(state, file).await,
    }
}

async fn extract_archive(state: Arc<AppState>, file: UploadedFile) -> Result<Response, ApiError> {
    let (archive, report) = tokio::task::spawn_blocking(move || {
        p7mtopdf_ingest::extract_zip(&file.data, &state.config, |_| {})
    })
    .await
    .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))?
    .map_err(|e| match e {
        BatchError::ContainerOpen(_) => ApiError::bad_request(e.to_string()),
        _ => ApiError::internal(e.to_string()),
    })?;

    let warnings_json = warnings_header(&report.warnings, MAX_WARNINGS_HEADER_BYTES)
        .map_err(|e| ApiError::internal(format!("Failed to encode warnings: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, attachment(OUTPUT_ARCHIVE_NAME)),
        ],
        [
            (WARNINGS_HEADER, warnings_json),
            (WARNINGS_TOTAL_HEADER, report.warnings.len().to_string()),
            (COUNT_HEADER, report.extracted.len().to_string()),
        ],
        archive,
    )
        .into_response())
}

async fn extract_single(state: Arc<AppState>, file: UploadedFile) -> Result<Response, ApiError> {
    let output_name = state.config.output_name(&file.filename);

    let pdf = tokio::task::spawn_blocking(move || {
        p7mtopdf_core::extract(&file.data, &file.filename).map(|pdf| pdf.to_vec())
    })
    .await
    .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))?
    .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&output_name)),
        ],
        pdf,
    )
        .into_response())
}
