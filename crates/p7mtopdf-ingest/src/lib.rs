use std::path::PathBuf;

use thiserror::Error;

pub mod archive;
pub mod batch;
pub mod dir;

// Re-export domain types for convenience
pub use p7mtopdf_core::{Config, ExtractError};
// Re-export batch API
pub use archive::{
    OUTPUT_ARCHIVE_NAME, ZipSink, ZipSource, extract_zip, extract_zip_file, has_zip_magic,
    is_archive_name,
};
pub use batch::{
    BatchEvent, BatchReport, ExtractedItem, ItemWarning, NamedBlobSink, NamedBlobSource,
    SourceEntry, run_batch,
};
pub use dir::{DirSink, DirSource, extract_dir, extract_file};

/// Errors that stop a whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to open ZIP: {0}")]
    ContainerOpen(#[source] zip::result::ZipError),
    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{name}': {source}")]
    SinkWrite {
        name: String,
        #[source]
        source: SinkError,
    },
    #[error("failed to finalize output ZIP: {0}")]
    Finish(#[source] zip::result::ZipError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Failure to read a single listed entry. Downgraded to a warning by the batch driver.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read entry: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("entry '{0}' is no longer available")]
    Missing(String),
}

/// Failure to store an extracted document.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
    #[error("duplicate output name: {0}")]
    Duplicate(String),
}
