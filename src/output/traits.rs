//! Result writer trait and shared types
//!
//! This module defines the interface every report format implements and the
//! error type for the output layer.

use crate::crawler::ScanResult;
use crate::output::stats::ScanStats;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A sink for scan results in one report format
///
/// Writers see only the results that should be reported; the caller applies
/// [`should_report`] first. `finish` is called exactly once, after the last
/// result.
pub trait ResultWriter: Send {
    /// Records one result
    fn write_result(&mut self, result: &ScanResult) -> OutputResult<()>;

    /// Completes the report
    ///
    /// # Arguments
    ///
    /// * `stats` - Totals over every result of the scan, reported or not
    fn finish(&mut self, stats: &ScanStats) -> OutputResult<()>;
}

/// Decides whether a result belongs in the report
///
/// Redirects are reported only when requested; transport errors and every
/// other status always are.
pub fn should_report(result: &ScanResult, include_redirects: bool) -> bool {
    include_redirects || !result.is_redirect()
}
