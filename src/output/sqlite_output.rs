//! SQLite result writer
//!
//! Each scan gets one row in `scans`; every reported result is a row in
//! `results` referencing it.

use crate::crawler::ScanResult;
use crate::output::stats::ScanStats;
use crate::output::traits::{OutputResult, ResultWriter};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the results database
pub const SCHEMA_SQL: &str = r#"
-- One row per scan
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    base_urls TEXT NOT NULL,
    config_hash TEXT,
    total_results INTEGER,
    total_errors INTEGER
);

-- One row per reported probe
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL REFERENCES scans(id),
    url TEXT NOT NULL,
    provenance TEXT NOT NULL,
    method TEXT NOT NULL,
    status_code INTEGER,
    content_length INTEGER,
    content_type TEXT,
    redirect TEXT,
    elapsed_ms INTEGER NOT NULL,
    error_kind TEXT,
    error_message TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_results_scan ON results(scan_id);
CREATE INDEX IF NOT EXISTS idx_results_status ON results(status_code);
"#;

/// Writes results to a SQLite database
pub struct SqliteWriter {
    conn: Connection,
    scan_id: i64,
}

impl SqliteWriter {
    /// Opens (or creates) the database and starts a scan record
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `base_urls` - The scan's base URLs, stored with the scan record
    /// * `config_hash` - Hash of the config file used, if any
    pub fn new(path: &Path, base_urls: &[String], config_hash: Option<&str>) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::with_connection(conn, base_urls, config_hash)
    }

    /// Uses an in-memory database
    pub fn in_memory(base_urls: &[String]) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, base_urls, None)
    }

    fn with_connection(conn: Connection, base_urls: &[String], config_hash: Option<&str>) -> OutputResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT INTO scans (started_at, base_urls, config_hash) VALUES (?1, ?2, ?3)",
            params![Utc::now().to_rfc3339(), base_urls.join(" "), config_hash],
        )?;
        let scan_id = conn.last_insert_rowid();
        tracing::debug!("Recording results as scan {}", scan_id);
        Ok(Self { conn, scan_id })
    }

    pub fn scan_id(&self) -> i64 {
        self.scan_id
    }

    /// Number of results stored for this scan
    pub fn count_results(&self) -> OutputResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM results WHERE scan_id = ?1",
            params![self.scan_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl ResultWriter for SqliteWriter {
    fn write_result(&mut self, result: &ScanResult) -> OutputResult<()> {
        let (error_kind, error_message) = match &result.error {
            Some(error) => (Some(error.kind.to_string()), Some(error.message.clone())),
            None => (None, None),
        };

        self.conn.execute(
            "INSERT INTO results (scan_id, url, provenance, method, status_code, content_length,
                                  content_type, redirect, elapsed_ms, error_kind, error_message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.scan_id,
                result.url.as_str(),
                result.provenance.as_str(),
                result.method.as_str(),
                result.status,
                result.content_length.map(|l| l as i64),
                result.content_type,
                result.redirect.as_ref().map(|u| u.as_str()),
                result.elapsed.as_millis() as i64,
                error_kind,
                error_message,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self, stats: &ScanStats) -> OutputResult<()> {
        let finished = stats.finished_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            "UPDATE scans SET finished_at = ?1, total_results = ?2, total_errors = ?3 WHERE id = ?4",
            params![
                finished.to_rfc3339(),
                stats.total as i64,
                stats.errors() as i64,
                self.scan_id
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Candidate, ProbeError, ProbeErrorKind, ProbeMethod, ProbeResponse, Provenance};
    use std::time::Duration;
    use url::Url;

    fn candidate(path: &str) -> Candidate {
        Candidate::new(
            Url::parse(&format!("http://example.test{}", path)).unwrap(),
            Provenance::Wordlist,
        )
    }

    #[test]
    fn test_write_and_finish() {
        let mut writer = SqliteWriter::in_memory(&["http://example.test/".to_string()]).unwrap();
        let response = ProbeResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            content_length: Some(10),
            ..ProbeResponse::default()
        };
        let ok = ScanResult::from_response(&candidate("/admin"), ProbeMethod::Get, &response, Duration::from_millis(7));
        let failed = ScanResult::from_error(
            &candidate("/down"),
            ProbeMethod::Get,
            ProbeError::new(ProbeErrorKind::Connect, "refused"),
            Duration::ZERO,
        );

        let mut stats = ScanStats::new();
        for result in [&ok, &failed] {
            stats.record(result);
            writer.write_result(result).unwrap();
        }
        writer.finish(&stats).unwrap();

        assert_eq!(writer.count_results().unwrap(), 2);

        let (status, provenance, elapsed): (Option<u16>, String, i64) = writer
            .conn
            .query_row(
                "SELECT status_code, provenance, elapsed_ms FROM results WHERE url = ?1",
                params!["http://example.test/admin"],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(status, Some(200));
        assert_eq!(provenance, "wordlist");
        assert_eq!(elapsed, 7);

        let (total, errors): (i64, i64) = writer
            .conn
            .query_row(
                "SELECT total_results, total_errors FROM scans WHERE id = ?1",
                params![writer.scan_id()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((total, errors), (2, 1));
    }

    #[test]
    fn test_error_columns() {
        let mut writer = SqliteWriter::in_memory(&[]).unwrap();
        let failed = ScanResult::from_error(
            &candidate("/slow"),
            ProbeMethod::Head,
            ProbeError::new(ProbeErrorKind::Timeout, "deadline"),
            Duration::ZERO,
        );
        writer.write_result(&failed).unwrap();

        let (kind, method, status): (String, String, Option<u16>) = writer
            .conn
            .query_row(
                "SELECT error_kind, method, status_code FROM results",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(kind, "timeout");
        assert_eq!(method, "HEAD");
        assert_eq!(status, None);
    }
}
