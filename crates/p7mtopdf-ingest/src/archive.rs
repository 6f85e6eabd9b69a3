use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use p7mtopdf_core::Config;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::batch::{
    BatchEvent, BatchReport, NamedBlobSink, NamedBlobSource, SourceEntry, run_batch,
};
use crate::{BatchError, SinkError, SourceError};

/// Name of the archive produced in bulk mode.
pub const OUTPUT_ARCHIVE_NAME: &str = "extracted_pdfs.zip";

/// Returns true if the given name looks like a ZIP archive.
pub fn is_archive_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

/// Returns true if the data starts with a ZIP local file header or an
/// empty-archive end-of-central-directory record.
pub fn has_zip_magic(data: &[u8]) -> bool {
    data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06")
}

/// Entries of a ZIP archive.
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self, BatchError> {
        let archive = ZipArchive::new(reader).map_err(BatchError::ContainerOpen)?;
        Ok(Self { archive })
    }
}

impl<R: Read + Seek> NamedBlobSource for ZipSource<R> {
    fn entries(&mut self) -> Result<Vec<SourceEntry>, BatchError> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self
                .archive
                .by_index(i)
                .map_err(BatchError::ContainerOpen)?;
            entries.push(SourceEntry {
                name: file.name().to_string(),
                size: file.size(),
                is_dir: file.is_dir(),
                enclosed: file.enclosed_name().is_some(),
                index: i,
            });
        }
        Ok(entries)
    }

    fn read(&mut self, entry: &SourceEntry) -> Result<Vec<u8>, SourceError> {
        let mut file = self.archive.by_index(entry.index)?;
        let mut buf = Vec::with_capacity(file.size().min(64 * 1024 * 1024) as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Deflate-compressed output archive.
pub struct ZipSink<W: Write + Seek> {
    writer: ZipWriter<W>,
    written: HashSet<String>,
}

impl<W: Write + Seek> ZipSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: ZipWriter::new(writer),
            written: HashSet::new(),
        }
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> Result<W, BatchError> {
        self.writer.finish().map_err(BatchError::Finish)
    }
}

impl<W: Write + Seek> NamedBlobSink for ZipSink<W> {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError> {
        if !self.written.insert(name.to_string()) {
            return Err(SinkError::Duplicate(name.to_string()));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer.write_all(data)?;
        Ok(())
    }
}

/// Extract every eligible entry of an in-memory ZIP into a new in-memory ZIP.
///
/// Entries that fail extraction are left out of the output and reported as
/// warnings. Returns the output archive bytes and the report.
pub fn extract_zip(
    data: &[u8],
    config: &Config,
    on_event: impl FnMut(BatchEvent<'_>),
) -> Result<(Vec<u8>, BatchReport), BatchError> {
    let mut source = ZipSource::new(Cursor::new(data))?;
    let mut sink = ZipSink::new(Cursor::new(Vec::new()));
    let report = run_batch(&mut source, &mut sink, config, on_event)?;
    let out = sink.finish()?.into_inner();
    Ok((out, report))
}

/// Extract every eligible entry of the ZIP at `input` into a new ZIP at `output`.
///
/// The archive is assembled in a temporary file next to `output` and only
/// moved into place once the batch succeeds, so a failed run leaves any
/// existing `output` untouched.
pub fn extract_zip_file(
    input: &Path,
    output: &Path,
    config: &Config,
    on_event: impl FnMut(BatchEvent<'_>),
) -> Result<BatchReport, BatchError> {
    let reader = File::open(input).map_err(|source| BatchError::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let mut source = ZipSource::new(std::io::BufReader::new(reader))?;

    let sink_err = |e: std::io::Error| BatchError::SinkWrite {
        name: output.display().to_string(),
        source: SinkError::Io(e),
    };
    let parent = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut sink = ZipSink::new(tempfile::NamedTempFile::new_in(parent).map_err(sink_err)?);

    let report = run_batch(&mut source, &mut sink, config, on_event)?;
    sink.finish()?
        .persist(output)
        .map_err(|e| sink_err(e.error))?;
    Ok(report)
}
