//! Output module for scan reports
//!
//! This module handles:
//! - Writing results as plain text, markdown, or SQLite rows
//! - Filtering redirects out of the report unless requested
//! - Recording scan statistics for the end-of-scan summary

mod markdown;
mod sqlite_output;
pub mod stats;
mod text;
mod traits;

pub use markdown::{format_markdown_report, MarkdownWriter};
pub use sqlite_output::SqliteWriter;
pub use stats::{print_statistics, ScanStats};
pub use text::{format_line, TextWriter};
pub use traits::{should_report, OutputError, OutputResult, ResultWriter};

use crate::config::{OutputFormat, ScanSettings};
use crate::crawler::ScanResult;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use tokio::sync::mpsc;

/// Opens the writer selected by the settings
///
/// # Arguments
///
/// * `settings` - Supplies the format, the output path and the base URLs
/// * `config_hash` - Hash of the loaded config file, stored by SQLite output
///
/// # Returns
///
/// * `Ok(Box<dyn ResultWriter>)` - A writer to the file, or stdout when no path is set
/// * `Err(OutputError)` - The file could not be created
pub fn open_writer(settings: &ScanSettings, config_hash: Option<&str>) -> OutputResult<Box<dyn ResultWriter>> {
    let path = settings.output_path.as_deref().map(Path::new);

    let writer: Box<dyn ResultWriter> = match (settings.output_format, path) {
        (OutputFormat::Sqlite, Some(path)) => {
            Box::new(SqliteWriter::new(path, &settings.urls, config_hash)?)
        }
        (OutputFormat::Sqlite, None) => {
            return Err(OutputError::Write(
                "SQLite output requires an output path".to_string(),
            ))
        }
        (OutputFormat::Markdown, Some(path)) => Box::new(MarkdownWriter::new(
            BufWriter::new(File::create(path)?),
            settings.urls.join(", "),
        )),
        (OutputFormat::Markdown, None) => {
            Box::new(MarkdownWriter::new(io::stdout(), settings.urls.join(", ")))
        }
        (OutputFormat::Text, Some(path)) => Box::new(TextWriter::new(BufWriter::new(File::create(path)?))),
        (OutputFormat::Text, None) => Box::new(TextWriter::new(io::stdout())),
    };

    tracing::debug!("Writing {} output", settings.output_format);
    Ok(writer)
}

/// Drains the result channel into a writer until every sender is gone
///
/// Every result is counted; only those passing [`should_report`] are
/// written. The writer is finished once the channel closes.
pub async fn consume_results(
    mut results: mpsc::Receiver<ScanResult>,
    mut writer: Box<dyn ResultWriter>,
    include_redirects: bool,
) -> OutputResult<ScanStats> {
    let mut stats = ScanStats::new();

    while let Some(result) = results.recv().await {
        stats.record(&result);
        if should_report(&result, include_redirects) {
            writer.write_result(&result)?;
            stats.reported += 1;
        }
    }

    stats.finish();
    writer.finish(&stats)?;
    Ok(stats)
}
