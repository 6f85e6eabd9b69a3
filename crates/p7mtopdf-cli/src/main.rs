use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use p7mtopdf_core::{Config, config_file};
use p7mtopdf_ingest::{BatchEvent, OUTPUT_ARCHIVE_NAME};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// p7mtopdf - Extract the PDF documents embedded in signed .p7m files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file to use instead of the platform/CWD cascade
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Container suffix to look for (default: .p7m)
    #[arg(long, global = true)]
    suffix: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the PDF from a single signed file
    File {
        /// Path to the .p7m file
        input: PathBuf,

        /// Where to write the PDF (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract every signed file in a directory into another directory
    Dir {
        /// Directory containing .p7m files
        input: PathBuf,

        /// Directory to write the PDFs to (created if missing)
        output: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Extract every signed file in a ZIP archive into a new ZIP archive
    Zip {
        /// Path to the input ZIP archive
        input: PathBuf,

        /// Path of the output ZIP archive
        #[arg(short, long, default_value = OUTPUT_ARCHIVE_NAME)]
        output: PathBuf,
    },

    /// Print the resolved configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.suffix)?;
    let color = ColorMode(!cli.no_color);
    let mut writer = std::io::stdout().lock();

    match cli.command {
        Command::File { input, output } => {
            extract_single(&mut writer, &input, output.as_deref(), &config, color)
        }
        Command::Dir {
            input,
            output,
            recursive,
        } => extract_dir(&mut writer, &input, &output, recursive, &config, color),
        Command::Zip { input, output } => extract_zip(&mut writer, &input, &output, &config, color),
        Command::Config => print_config(&mut writer, cli.config.as_deref(), &config),
    }
}

/// Resolve configuration: CLI flags > config files > defaults.
fn resolve_config(path: Option<&Path>, suffix: Option<String>) -> anyhow::Result<Config> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            config_file::load_from_path(path)
                .ok_or_else(|| anyhow::anyhow!("Invalid config file: {}", path.display()))?
        }
        None => config_file::load_config(),
    };

    let mut config = Config::from_file(&file);
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        config.container_suffix = if suffix.starts_with('.') {
            suffix
        } else {
            format!(".{suffix}")
        };
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn extract_single(
    writer: &mut dyn Write,
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !input.is_file() {
        anyhow::bail!("File not found: {}", input.display());
    }
    let (out_path, item) = p7mtopdf_ingest::extract_file(input, output, config)?;
    output::print_single(writer, &item, &out_path, color)?;
    Ok(())
}

fn extract_dir(
    writer: &mut dyn Write,
    input: &Path,
    output: &Path,
    recursive: bool,
    config: &Config,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !input.is_dir() {
        anyhow::bail!("Directory not found: {}", input.display());
    }

    let mut write_err = None;
    let report = p7mtopdf_ingest::extract_dir(input, output, recursive, config, |event| {
        print_progress(writer, &event, color, &mut write_err);
    })?;
    if let Some(e) = write_err {
        return Err(e.into());
    }

    output::print_summary(writer, &report, output, color)?;
    Ok(())
}

fn extract_zip(
    writer: &mut dyn Write,
    input: &Path,
    output: &Path,
    config: &Config,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !input.is_file() {
        anyhow::bail!("Archive not found: {}", input.display());
    }
    if same_file(input, output)? {
        anyhow::bail!("Output archive must differ from the input archive");
    }

    let mut write_err = None;
    let report = p7mtopdf_ingest::extract_zip_file(input, output, config, |event| {
        print_progress(writer, &event, color, &mut write_err);
    })?;
    if let Some(e) = write_err {
        return Err(e.into());
    }

    output::print_summary(writer, &report, output, color)?;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> std::io::Result<bool> {
    if !a.exists() || !b.exists() {
        return Ok(false);
    }
    Ok(std::fs::canonicalize(a)? == std::fs::canonicalize(b)?)
}

/// Print a progress line, keeping the first write failure for later.
fn print_progress(
    writer: &mut dyn Write,
    event: &BatchEvent<'_>,
    color: ColorMode,
    write_err: &mut Option<std::io::Error>,
) {
    if write_err.is_some() {
        return;
    }
    if let Err(e) = output::print_event(writer, event, color).and_then(|_| writer.flush()) {
        *write_err = Some(e);
    }
}

fn print_config(writer: &mut dyn Write, path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    match path {
        Some(path) => writeln!(writer, "config file:       {}", path.display())?,
        None => {
            let platform = config_file::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string());
            writeln!(writer, "config files:      {} (overridden by ./{})", platform, config_file::LOCAL_CONFIG_NAME)?;
        }
    }
    writeln!(writer, "container suffix:  {}", config.container_suffix)?;
    writeln!(writer, "output suffix:     {}", config.output_suffix)?;
    writeln!(writer, "max archive size:  {} bytes", config.max_archive_size)?;
    writeln!(writer, "max upload size:   {} bytes", config.max_upload_size)?;
    writeln!(writer, "server bind:       {}", config.bind)?;
    Ok(())
}
