//! Markdown report generation
//!
//! Results are buffered and the whole report is written on `finish`, with
//! run information, status statistics and a results table.

use crate::crawler::ScanResult;
use crate::output::stats::ScanStats;
use crate::output::traits::{OutputResult, ResultWriter};
use std::io::Write;

/// Markdown report writer
pub struct MarkdownWriter<W: Write + Send> {
    out: W,
    title: String,
    results: Vec<ScanResult>,
}

impl<W: Write + Send> MarkdownWriter<W> {
    /// Creates a writer whose report is headed by `title`
    pub fn new(out: W, title: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
            results: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ResultWriter for MarkdownWriter<W> {
    fn write_result(&mut self, result: &ScanResult) -> OutputResult<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn finish(&mut self, stats: &ScanStats) -> OutputResult<()> {
        self.results.sort_by(|a, b| a.url.cmp(&b.url));
        let markdown = format_markdown_report(&self.title, &self.results, stats);
        self.out.write_all(markdown.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Formats a scan report as markdown
///
/// # Arguments
///
/// * `title` - Report heading, typically the scanned base URLs
/// * `results` - The reported results, in display order
/// * `stats` - Totals over the whole scan
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(title: &str, results: &[ScanResult], stats: &ScanStats) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Borer Scan: {}\n\n", title));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n\n",
        stats.duration().num_milliseconds() as f64 / 1000.0
    ));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Results**: {}\n", stats.total));
    md.push_str(&format!("- **Reported**: {}\n", stats.reported));
    md.push_str(&format!("- **Successful (2xx)**: {}\n", stats.successes()));
    md.push_str(&format!("- **Transport Errors**: {}\n", stats.errors()));
    md.push_str(&format!(
        "- **Average Response Time**: {} ms\n\n",
        stats.average_elapsed().as_millis()
    ));

    if !stats.by_status.is_empty() {
        md.push_str("## Status Codes\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &stats.by_status {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
        md.push('\n');
    }

    if !stats.by_error.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");
        for (kind, count) in &stats.by_error {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    md.push_str("## Results\n\n");
    if results.is_empty() {
        md.push_str("No results.\n");
        return md;
    }

    md.push_str("| Status | Size | URL | Source | Notes |\n");
    md.push_str("|--------|------|-----|--------|-------|\n");
    for result in results {
        let status = match (&result.error, result.status) {
            (Some(_), _) => "ERR".to_string(),
            (None, Some(status)) => status.to_string(),
            (None, None) => "-".to_string(),
        };
        let size = result
            .content_length
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let notes = match (&result.error, &result.redirect) {
            (Some(error), _) => escape_cell(&error.to_string()),
            (None, Some(target)) => format!("-> {}", escape_cell(target.as_str())),
            (None, None) => String::new(),
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            status,
            size,
            escape_cell(result.url.as_str()),
            result.provenance,
            notes
        ));
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
