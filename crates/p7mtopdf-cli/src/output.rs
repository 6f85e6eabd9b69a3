use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use p7mtopdf_ingest::{BatchEvent, BatchReport, ExtractedItem};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one line per processed container.
pub fn print_event(w: &mut dyn Write, event: &BatchEvent<'_>, color: ColorMode) -> std::io::Result<()> {
    match event {
        BatchEvent::Extracted(item) => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} {} -> {} ({})",
                    "[OK]".green().bold(),
                    item.name,
                    item.output_name.bold(),
                    format_size(item.len).dimmed()
                )
            } else {
                writeln!(
                    w,
                    "[OK] {} -> {} ({})",
                    item.name,
                    item.output_name,
                    format_size(item.len)
                )
            }
        }
        BatchEvent::Skipped(warning) => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} {}: {}",
                    "[SKIP]".yellow().bold(),
                    warning.name,
                    warning.message.yellow()
                )
            } else {
                writeln!(w, "[SKIP] {}: {}", warning.name, warning.message)
            }
        }
    }
}

/// Print the result of a single-file extraction.
pub fn print_single(
    w: &mut dyn Write,
    item: &ExtractedItem,
    out_path: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "{} -> {} ({}, offset {})",
        item.name,
        out_path.display(),
        format_size(item.len),
        item.offset
    );
    if color.enabled() {
        writeln!(w, "{} {}", "[OK]".green().bold(), line)
    } else {
        writeln!(w, "[OK] {}", line)
    }
}

/// Print the end-of-batch summary.
pub fn print_summary(
    w: &mut dyn Write,
    report: &BatchReport,
    destination: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let extracted = report.extracted.len();
    let skipped = report.warnings.len();

    if extracted == 0 && skipped == 0 {
        writeln!(w, "No eligible containers found.")?;
        return Ok(());
    }

    if color.enabled() {
        writeln!(
            w,
            "{} extracted, {} skipped -> {}",
            extracted.to_string().green().bold(),
            if skipped > 0 {
                skipped.to_string().yellow().bold().to_string()
            } else {
                skipped.to_string()
            },
            destination.display().bold()
        )?;
    } else {
        writeln!(
            w,
            "{} extracted, {} skipped -> {}",
            extracted,
            skipped,
            destination.display()
        )?;
    }
    Ok(())
}

fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
