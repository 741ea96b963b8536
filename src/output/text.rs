//! Plain text output, one line per result

use crate::crawler::ScanResult;
use crate::output::stats::ScanStats;
use crate::output::traits::{OutputResult, ResultWriter};
use std::io::Write;

/// Writes `STATUS SIZE URL [-> REDIRECT]` lines, or `ERR kind URL message`
pub struct TextWriter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TextWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Formats one result as a report line
pub fn format_line(result: &ScanResult) -> String {
    if let Some(error) = &result.error {
        return format!("ERR {} {} {}", error.kind, result.url, error.message);
    }

    let status = result
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let size = result
        .content_length
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());

    match &result.redirect {
        Some(target) => format!("{} {} {} -> {}", status, size, result.url, target),
        None => format!("{} {} {}", status, size, result.url),
    }
}

impl<W: Write + Send> ResultWriter for TextWriter<W> {
    fn write_result(&mut self, result: &ScanResult) -> OutputResult<()> {
        writeln!(self.out, "{}", format_line(result))?;
        Ok(())
    }

    fn finish(&mut self, _stats: &ScanStats) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
