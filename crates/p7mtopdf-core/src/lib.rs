use thiserror::Error;

pub mod config_file;
pub mod extract;
pub mod naming;

// Re-export for convenience
pub use config_file::ConfigFile;
pub use extract::{Marker, extract, extract_span, locate_pdf};
pub use naming::{CONTAINER_SUFFIX, OUTPUT_SUFFIX, is_eligible, output_name};

/// Failure to recover a PDF from a container.
///
/// A missing header and a missing trailer are reported as the same kind;
/// `missing` only says which marker the search stopped on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no PDF content found in '{label}' (missing {missing} marker)")]
    NoPdfMarkerFound { label: String, missing: Marker },
}

const MB: u64 = 1024 * 1024;

/// Default cap on the total uncompressed size of eligible archive entries.
pub const DEFAULT_MAX_ARCHIVE_SIZE_MB: u64 = 500;
/// Default cap on a single web upload.
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 500;
pub const DEFAULT_BIND: &str = "0.0.0.0:5001";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub container_suffix: String,
    pub output_suffix: String,
    /// Total bytes of eligible entries read from one archive (0 = unlimited).
    pub max_archive_size: u64,
    /// Largest accepted upload body in bytes (0 = unlimited).
    pub max_upload_size: u64,
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_suffix: CONTAINER_SUFFIX.to_string(),
            output_suffix: OUTPUT_SUFFIX.to_string(),
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE_MB * MB,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE_MB * MB,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    /// Apply the values present in a config file over the defaults.
    pub fn from_file(file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let extraction = file.extraction.clone().unwrap_or_default();
        let limits = file.limits.clone().unwrap_or_default();
        let server = file.server.clone().unwrap_or_default();

        Self {
            container_suffix: extraction
                .container_suffix
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.container_suffix),
            output_suffix: extraction
                .output_suffix
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.output_suffix),
            max_archive_size: limits
                .max_archive_size_mb
                .map_or(defaults.max_archive_size, |mb| mb.saturating_mul(MB)),
            max_upload_size: limits
                .max_upload_size_mb
                .map_or(defaults.max_upload_size, |mb| mb.saturating_mul(MB)),
            bind: server.bind.unwrap_or(defaults.bind),
        }
    }

    /// Whether `name` should be handed to the extractor.
    pub fn is_eligible(&self, name: &str) -> bool {
        naming::is_eligible(name, &self.container_suffix)
    }

    /// Output name for an eligible container name.
    pub fn output_name(&self, name: &str) -> String {
        naming::output_name(name, &self.container_suffix, &self.output_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_file::{ExtractionConfig, LimitsConfig};

    #[test]
    fn defaults_match_p7m_to_pdf() {
        let config = Config::default();
        assert!(config.is_eligible("a.P7M"));
        assert_eq!(config.output_name("a.P7M"), "a.pdf");
        assert_eq!(config.max_archive_size, 500 * 1024 * 1024);
    }

    #[test]
    fn from_file_overrides_present_fields() {
        let file = ConfigFile {
            extraction: Some(ExtractionConfig {
                container_suffix: Some(".p7s".to_string()),
                output_suffix: None,
            }),
            limits: Some(LimitsConfig {
                max_archive_size_mb: Some(0),
                max_upload_size_mb: None,
            }),
            server: None,
        };
        let config = Config::from_file(&file);
        assert_eq!(config.container_suffix, ".p7s");
        assert_eq!(config.output_suffix, ".pdf");
        assert_eq!(config.max_archive_size, 0);
        assert_eq!(config.max_upload_size, Config::default().max_upload_size);
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn huge_size_limits_saturate() {
        let file: ConfigFile = toml::from_str(
            "[limits]\nmax_archive_size_mb = 20000000000000\nmax_upload_size_mb = 9223372036854775807\n",
        )
        .unwrap();
        let config = Config::from_file(&file);
        assert_eq!(config.max_archive_size, u64::MAX);
        assert_eq!(config.max_upload_size, u64::MAX);
    }

    #[test]
    fn empty_suffix_falls_back_to_default() {
        let file = ConfigFile {
            extraction: Some(ExtractionConfig {
                container_suffix: Some(String::new()),
                output_suffix: Some(String::new()),
            }),
            ..Default::default()
        };
        let config = Config::from_file(&file);
        assert_eq!(config.container_suffix, CONTAINER_SUFFIX);
        assert_eq!(config.output_suffix, OUTPUT_SUFFIX);
    }

    #[test]
    fn error_kind_is_shared_by_both_markers() {
        let start = extract(b"", "a").unwrap_err();
        let end = extract(b"%PDF-", "a").unwrap_err();
        assert!(matches!(start, ExtractError::NoPdfMarkerFound { .. }));
        assert!(matches!(end, ExtractError::NoPdfMarkerFound { .. }));
        assert_ne!(start, end);
    }
}
