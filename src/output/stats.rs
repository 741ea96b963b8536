//! Scan statistics
//!
//! Tallies every result of a scan by status code and error kind, for the
//! report footers and the end-of-scan summary.

use crate::crawler::ScanResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Scan statistics summary
#[derive(Debug, Clone)]
pub struct ScanStats {
    /// When the first result was expected (output opened)
    pub started_at: DateTime<Utc>,

    /// When the last result was recorded
    pub finished_at: Option<DateTime<Utc>>,

    /// Every result seen
    pub total: u64,

    /// Results written to the report
    pub reported: u64,

    /// Count of results by status code
    pub by_status: BTreeMap<u16, u64>,

    /// Count of transport errors by kind
    pub by_error: BTreeMap<String, u64>,

    /// Sum of response times
    pub total_elapsed: Duration,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            reported: 0,
            by_status: BTreeMap::new(),
            by_error: BTreeMap::new(),
            total_elapsed: Duration::ZERO,
        }
    }

    /// Counts one result
    pub fn record(&mut self, result: &ScanResult) {
        self.total += 1;
        self.total_elapsed += result.elapsed;
        match (&result.error, result.status) {
            (Some(error), _) => *self.by_error.entry(error.kind.to_string()).or_default() += 1,
            (None, Some(status)) => *self.by_status.entry(status).or_default() += 1,
            (None, None) => {}
        }
    }

    /// Marks the scan finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn errors(&self) -> u64 {
        self.by_error.values().sum()
    }

    /// Results with a 2xx status
    pub fn successes(&self) -> u64 {
        self.by_status
            .range(200..300)
            .map(|(_, count)| count)
            .sum()
    }

    /// Mean time to response headers
    pub fn average_elapsed(&self) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_elapsed.as_nanos() / u128::from(self.total);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Wall-clock duration from start to finish (or now)
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// Prints statistics in a human-readable format
///
/// Goes to stderr; stdout may be carrying the report itself.
pub fn print_statistics(stats: &ScanStats) {
    eprintln!("=== Scan Statistics ===\n");
    eprintln!("Overview:");
    eprintln!("  Total results: {}", stats.total);
    eprintln!("  Reported: {}", stats.reported);
    eprintln!("  Successful (2xx): {}", stats.successes());
    eprintln!("  Transport errors: {}", stats.errors());
    eprintln!("  Average response time: {:?}", stats.average_elapsed());
    eprintln!(
        "  Duration: {:.1}s",
        stats.duration().num_milliseconds() as f64 / 1000.0
    );
    eprintln!();

    if !stats.by_status.is_empty() {
        eprintln!("Results by Status:");
        for (status, count) in &stats.by_status {
            eprintln!("  {}: {}", status, count);
        }
        eprintln!();
    }

    if !stats.by_error.is_empty() {
        eprintln!("Error Summary:");
        let mut error_counts: Vec<_> = stats.by_error.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in error_counts {
            eprintln!("  {}: {}", kind, count);
        }
        eprintln!();
    }
}
