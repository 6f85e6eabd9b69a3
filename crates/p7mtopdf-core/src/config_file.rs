use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub limits: Option<LimitsConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub container_suffix: Option<String>,
    pub output_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_archive_size_mb: Option<u64>,
    pub max_upload_size_mb: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

/// Name of the per-directory override file.
pub const LOCAL_CONFIG_NAME: &str = ".p7mtopdf.toml";

/// Platform config directory path: `<config_dir>/p7mtopdf/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("p7mtopdf").join("config.toml"))
}

/// Load config by cascading CWD `.p7mtopdf.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_NAME));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionConfig {
            container_suffix: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.container_suffix.clone())
                .or_else(|| {
                    base.extraction
                        .as_ref()
                        .and_then(|e| e.container_suffix.clone())
                }),
            output_suffix: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.output_suffix.clone())
                .or_else(|| base.extraction.as_ref().and_then(|e| e.output_suffix.clone())),
        }),
        limits: Some(LimitsConfig {
            max_archive_size_mb: overlay
                .limits
                .as_ref()
                .and_then(|l| l.max_archive_size_mb)
                .or_else(|| base.limits.as_ref().and_then(|l| l.max_archive_size_mb)),
            max_upload_size_mb: overlay
                .limits
                .as_ref()
                .and_then(|l| l.max_upload_size_mb)
                .or_else(|| base.limits.as_ref().and_then(|l| l.max_upload_size_mb)),
        }),
        server: Some(ServerConfig {
            bind: overlay
                .server
                .as_ref()
                .and_then(|s| s.bind.clone())
                .or_else(|| base.server.as_ref().and_then(|s| s.bind.clone())),
        }),
    }
}
