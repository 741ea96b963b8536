use super::{create_scanner, create_test_settings};
use borer::config::OutputFormat;
use borer::output::{consume_results, open_writer};
use rusqlite::{params, Connection};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a small site: a home page, a redirect and a hidden page
async fn mount_site(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/moved">Moved</a><a href="/about">About</a>"#.as_bytes().to_vec(),
            "text/html",
        ))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/about"))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"<p>about</p>".to_vec(), "text/html"))
        .mount(mock_server)
        .await;
}

/// Runs a scan whose results go through the configured writer
async fn scan_to_writer(settings: borer::ScanSettings) -> borer::output::ScanStats {
    let writer = open_writer(&settings, Some("cafebabe")).expect("Failed to open writer");
    let include_redirects = settings.include_redirects;
    let scanner = create_scanner(settings).with_words(Vec::new());

    let (tx, rx) = mpsc::channel(16);
    let output = tokio::spawn(consume_results(rx, writer, include_redirects));
    scanner.run(tx).await.expect("Scan failed");
    output.await.unwrap().expect("Output failed")
}

#[tokio::test]
async fn test_sqlite_output_records_results() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scan.db");
    let settings = borer::ScanSettings {
        output_format: OutputFormat::Sqlite,
        output_path: Some(db_path.display().to_string()),
        ..create_test_settings(&format!("{}/", mock_server.uri()))
    };

    let stats = scan_to_writer(settings).await;
    assert_eq!(stats.total, 3);
    // The 302 is not reported by default
    assert_eq!(stats.reported, 2);

    let conn = Connection::open(&db_path).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);

    let (hash, total): (String, i64) = conn
        .query_row(
            "SELECT config_hash, total_results FROM scans ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(hash, "cafebabe");
    assert_eq!(total, 3);

    let about_status: i64 = conn
        .query_row(
            "SELECT status_code FROM results WHERE url LIKE ?1",
            params!["%/about"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(about_status, 200);
}

#[tokio::test]
async fn test_markdown_report_with_redirects() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.md");
    let settings = borer::ScanSettings {
        output_format: OutputFormat::Markdown,
        output_path: Some(report_path.display().to_string()),
        include_redirects: true,
        ..create_test_settings(&format!("{}/", mock_server.uri()))
    };

    let stats = scan_to_writer(settings).await;
    assert_eq!(stats.reported, 3);

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("# Borer Scan:"));
    assert!(report.contains("## Status Codes"));
    assert!(report.contains("| 302 | 1 |"));
    assert!(report.contains("/moved |"));
    assert!(report.contains("-> http://127.0.0.1:"));
}

#[tokio::test]
async fn test_text_output_file() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.txt");
    let base_url = format!("{}/", mock_server.uri());
    let settings = borer::ScanSettings {
        output_path: Some(out_path.display().to_string()),
        ..create_test_settings(&base_url)
    };

    scan_to_writer(settings).await;

    let text = std::fs::read_to_string(&out_path).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.starts_with("200 ")));
    assert!(lines.iter().any(|l| l.ends_with(&format!("{}about", base_url))));
}
