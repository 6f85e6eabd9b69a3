use std::fs;
use std::path::{Component, Path, PathBuf};

use p7mtopdf_core::Config;

use crate::batch::{
    BatchEvent, BatchReport, ExtractedItem, NamedBlobSink, NamedBlobSource, SourceEntry, run_batch,
};
use crate::{BatchError, SinkError, SourceError};

/// Regular files under a directory.
pub struct DirSource {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl DirSource {
    /// Scan `root` for files, descending into subdirectories if `recursive`.
    /// Symlinked directories are not followed.
    pub fn new(root: &Path, recursive: bool) -> Result<Self, BatchError> {
        let mut files = Vec::new();
        collect_files(root, recursive, &mut files)?;
        files.sort();
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), BatchError> {
    let read_err = |source| BatchError::ReadInput {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        let path = entry.path();
        if file_type.is_dir() {
            if recursive {
                collect_files(&path, recursive, out)?;
            }
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl NamedBlobSource for DirSource {
    fn entries(&mut self) -> Result<Vec<SourceEntry>, BatchError> {
        Ok(self
            .files
            .iter()
            .enumerate()
            .map(|(index, path)| SourceEntry {
                name: relative_name(&self.root, path),
                size: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
                is_dir: false,
                enclosed: true,
                index,
            })
            .collect())
    }

    fn read(&mut self, entry: &SourceEntry) -> Result<Vec<u8>, SourceError> {
        let path = self
            .files
            .get(entry.index)
            .ok_or_else(|| SourceError::Missing(entry.name.clone()))?;
        Ok(fs::read(path)?)
    }
}

/// Files under an output directory, created on demand.
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl NamedBlobSink for DirSink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError> {
        let rel = Path::new(name);
        if name.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(SinkError::UnsafePath(name.to_string()));
        }
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }
}

/// Extract every eligible file under `input` into `output`, keeping relative paths.
pub fn extract_dir(
    input: &Path,
    output: &Path,
    recursive: bool,
    config: &Config,
    on_event: impl FnMut(BatchEvent<'_>),
) -> Result<BatchReport, BatchError> {
    let mut source = DirSource::new(input, recursive)?;
    let mut sink = DirSink::new(output);
    run_batch(&mut source, &mut sink, config, on_event)
}

/// Extract a single container file.
///
/// The PDF is written to `output`, or next to the input under the derived
/// name when `output` is `None`. Unlike batch mode, a container without a PDF
/// is an error.
pub fn extract_file(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
) -> Result<(PathBuf, ExtractedItem), BatchError> {
    let data = fs::read(input).map_err(|source| BatchError::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| input.display().to_string());

    let span = p7mtopdf_core::extract_span(&data, &name)?;
    let pdf = &data[span.clone()];

    let output_name = config.output_name(&name);
    let out_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(&output_name),
    };
    fs::write(&out_path, pdf).map_err(|e| BatchError::SinkWrite {
        name: out_path.display().to_string(),
        source: SinkError::Io(e),
    })?;

    tracing::debug!(input = %input.display(), output = %out_path.display(), bytes = pdf.len(), "extracted file");
    Ok((
        out_path,
        ExtractedItem {
            name,
            output_name,
            offset: span.start,
            len: span.len(),
        },
    ))
}
