//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and drive full scans
//! through the reqwest transport.

mod output_tests;
mod scan_tests;

use borer::config::ScanSettings;
use borer::crawler::{ClientFactory, ReqwestClientFactory, ScanSummary, Scanner};
use borer::robots::HttpRobotsSource;
use borer::ScanResult;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates settings for a scan of `base_url` suitable for tests
fn create_test_settings(base_url: &str) -> ScanSettings {
    ScanSettings {
        urls: vec![base_url.to_string()],
        workers: 4,
        timeout: 5_000,
        extensions: vec!["html".to_string(), "php".to_string()],
        ..ScanSettings::default()
    }
}

/// Builds a scanner on the real reqwest transport
fn create_scanner(settings: ScanSettings) -> Scanner {
    let settings = Arc::new(settings);
    let clients = Arc::new(ReqwestClientFactory::new(&settings).expect("Failed to build clients"));
    let robots = Arc::new(HttpRobotsSource::new(clients.client_for(0)));
    Scanner::new(settings, clients, robots)
}

/// Runs a scan with the given words instead of a wordlist file
async fn run_scan(settings: ScanSettings, words: &[&str]) -> (ScanSummary, Vec<ScanResult>) {
    let words = words.iter().map(|w| w.to_string()).collect();
    collect_scan(create_scanner(settings).with_words(words)).await
}

/// Runs a scan and returns its summary and every result, sorted by URL
async fn collect_scan(scanner: Scanner) -> (ScanSummary, Vec<ScanResult>) {
    let (tx, mut rx) = mpsc::channel(32);
    let collector = tokio::spawn(async move {
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    });

    let summary = scanner.run(tx).await.expect("Scan failed");
    let mut results = collector.await.expect("Collector panicked");
    results.sort_by(|a, b| a.url.cmp(&b.url));
    (summary, results)
}

/// Finds the result for a path, if it was probed
fn result_for<'a>(results: &'a [ScanResult], path: &str) -> Option<&'a ScanResult> {
    results.iter().find(|r| r.url.path() == path)
}
