//! Batch driver shared by the archive and directory front-ends.
//!
//! A [`NamedBlobSource`] lists entries without reading them, the driver picks
//! the eligible ones, runs the extractor on each and hands the results to a
//! [`NamedBlobSink`]. Per-entry failures become warnings; only failures of
//! the sink itself stop the batch.

use p7mtopdf_core::Config;

use crate::{BatchError, SinkError, SourceError};

/// An entry as listed by a source, before its content is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Name relative to the source root, `/`-separated.
    pub name: String,
    /// Uncompressed size as reported by the source.
    pub size: u64,
    pub is_dir: bool,
    /// False when the name would escape the output root (absolute or `..`).
    pub enclosed: bool,
    /// Source-specific position, passed back to [`NamedBlobSource::read`].
    pub index: usize,
}

/// Something that can enumerate and read named blobs.
pub trait NamedBlobSource {
    /// List all entries. Must not read entry contents.
    fn entries(&mut self) -> Result<Vec<SourceEntry>, BatchError>;

    /// Read the full content of one listed entry.
    fn read(&mut self, entry: &SourceEntry) -> Result<Vec<u8>, SourceError>;
}

/// Something that accepts named blobs.
pub trait NamedBlobSink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError>;
}

/// A container that was turned into a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub name: String,
    pub output_name: String,
    /// Offset of the PDF inside the container.
    pub offset: usize,
    /// Length of the extracted PDF.
    pub len: usize,
}

/// A container that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemWarning {
    pub name: String,
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub extracted: Vec<ExtractedItem>,
    pub warnings: Vec<ItemWarning>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty() && self.warnings.is_empty()
    }
}

/// Progress notification emitted once per eligible entry.
#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    Extracted(&'a ExtractedItem),
    Skipped(&'a ItemWarning),
}

/// Run the extractor over every eligible entry of `source`, writing results to `sink`.
pub fn run_batch<S, K>(
    source: &mut S,
    sink: &mut K,
    config: &Config,
    mut on_event: impl FnMut(BatchEvent<'_>),
) -> Result<BatchReport, BatchError>
where
    S: NamedBlobSource + ?Sized,
    K: NamedBlobSink + ?Sized,
{
    let mut report = BatchReport::default();
    let mut total_size: u64 = 0;

    for entry in source.entries()? {
        if entry.is_dir || !config.is_eligible(&entry.name) {
            continue;
        }

        if !entry.enclosed {
            skip(&mut report, &mut on_event, &entry.name, "unsafe entry path".into());
            continue;
        }

        if config.max_archive_size > 0 {
            total_size += entry.size;
            if total_size > config.max_archive_size {
                let message = format!(
                    "size limit ({}MB) reached after {} files, skipping remaining",
                    config.max_archive_size / 1024 / 1024,
                    report.extracted.len()
                );
                skip(&mut report, &mut on_event, &entry.name, message);
                break;
            }
        }

        let data = match source.read(&entry) {
            Ok(data) => data,
            Err(e) => {
                skip(&mut report, &mut on_event, &entry.name, e.to_string());
                continue;
            }
        };

        let span = match p7mtopdf_core::extract_span(&data, &entry.name) {
            Ok(span) => span,
            Err(e) => {
                skip(&mut report, &mut on_event, &entry.name, e.to_string());
                continue;
            }
        };

        let output_name = config.output_name(&entry.name);
        match sink.write(&output_name, &data[span.clone()]) {
            Ok(()) => {}
            Err(SinkError::Duplicate(dup)) => {
                skip(
                    &mut report,
                    &mut on_event,
                    &entry.name,
                    format!("output '{dup}' already written"),
                );
                continue;
            }
            Err(err) => {
                return Err(BatchError::SinkWrite {
                    name: output_name,
                    source: err,
                });
            }
        }

        tracing::debug!(
            name = %entry.name,
            output = %output_name,
            bytes = span.len(),
            "extracted entry"
        );
        report.extracted.push(ExtractedItem {
            name: entry.name,
            output_name,
            offset: span.start,
            len: span.len(),
        });
        if let Some(item) = report.extracted.last() {
            on_event(BatchEvent::Extracted(item));
        }
    }

    tracing::info!(
        extracted = report.extracted.len(),
        skipped = report.warnings.len(),
        "batch complete"
    );
    Ok(report)
}

fn skip(
    report: &mut BatchReport,
    on_event: &mut impl FnMut(BatchEvent<'_>),
    name: &str,
    message: String,
) {
    tracing::warn!(name, reason = %message, "skipping entry");
    report.warnings.push(ItemWarning {
        name: name.to_string(),
        message,
    });
    if let Some(warning) = report.warnings.last() {
        on_event(BatchEvent::Skipped(warning));
    }
}
