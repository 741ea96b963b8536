use super::{collect_scan, create_scanner, create_test_settings, result_for, run_scan};
use borer::crawler::{ProbeErrorKind, ProbeMethod};
use borer::{Provenance, RobotsMode};
use std::collections::BTreeSet;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

#[tokio::test]
async fn test_full_scan_follows_links() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{}page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="http://other.invalid/">Elsewhere</a>
            </body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<a href="page3">Page 3</a><a href="/">Home</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(html("<p>leaf</p>".to_string()))
        .mount(&mock_server)
        .await;

    let (summary, results) = run_scan(create_test_settings(&base_url), &[]).await;

    let paths: Vec<&str> = results.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/", "/page1", "/page2", "/page3"]);
    assert_eq!(result_for(&results, "/page2").unwrap().status, Some(404));
    assert_eq!(result_for(&results, "/page3").unwrap().provenance, Provenance::Discovered);
    assert_eq!(results[0].provenance, Provenance::ScopeRoot);
    assert_eq!(summary.probes, 4);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn test_wordlist_mangling_finds_hidden_file() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/admin.php"))
        .respond_with(html("<p>login</p>".to_string()))
        .mount(&mock_server)
        .await;

    let mut wordlist = tempfile::NamedTempFile::new().unwrap();
    writeln!(wordlist, "# test words").unwrap();
    writeln!(wordlist, "admin").unwrap();
    writeln!(wordlist, "backup.zip").unwrap();

    let settings = borer::ScanSettings {
        wordlist: Some(wordlist.path().display().to_string()),
        ..create_test_settings(&base_url)
    };
    let (summary, results) = collect_scan(create_scanner(settings)).await;

    let found = result_for(&results, "/admin.php").expect("mangled variant probed");
    assert_eq!(found.status, Some(200));
    assert_eq!(found.provenance, Provenance::Mangled);
    assert_eq!(result_for(&results, "/admin").unwrap().provenance, Provenance::Wordlist);
    assert_eq!(result_for(&results, "/admin.html").unwrap().status, Some(404));
    // Names with an extension are not mangled
    assert!(result_for(&results, "/backup.zip").is_some());
    assert!(result_for(&results, "/backup.zip.php").is_none());
    // Root, admin (+2 variants), backup.zip
    assert_eq!(summary.probes, 5);
}

#[tokio::test]
async fn test_robots_obey_skips_disallowed_paths() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/private/secret">Secret</a><a href="/public">Public</a>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;

    // Should never be requested
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("<p>secret</p>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        robots_mode: RobotsMode::Obey,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["private"]).await;

    let paths: Vec<&str> = results.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/", "/public"]);
    // Wiremock verifies expect(0) when the mock server drops
}

#[tokio::test]
async fn test_robots_seed_probes_listed_paths() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: *\nDisallow: /hidden-admin/\nDisallow: /tmp/*.bak\nAllow: /open\n",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hidden-admin/"))
        .respond_with(html("<p>admin</p>".to_string()))
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        robots_mode: RobotsMode::Seed,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &[]).await;

    let seeded: BTreeSet<&str> = results
        .iter()
        .filter(|r| r.provenance == Provenance::RobotsSeed)
        .map(|r| r.url.path())
        .collect();
    assert_eq!(seeded, BTreeSet::from(["/hidden-admin/", "/open", "/tmp/"]));
    assert_eq!(result_for(&results, "/hidden-admin/").unwrap().status, Some(200));
}

#[tokio::test]
async fn test_missing_robots_does_not_block_scan() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>".to_string()))
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        robots_mode: RobotsMode::Obey,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["anything"]).await;
    assert_eq!(result_for(&results, "/").unwrap().status, Some(200));
    assert!(result_for(&results, "/anything").is_some());
}

#[tokio::test]
async fn test_spider_codes_gate_extraction() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_raw(r#"<a href="/inner">inner</a>"#.as_bytes().to_vec(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        mangle: false,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["secret"]).await;
    assert_eq!(result_for(&results, "/secret").unwrap().status, Some(403));
    assert!(result_for(&results, "/inner").is_none());

    let settings = borer::ScanSettings {
        mangle: false,
        spider_codes: BTreeSet::from([200, 403]),
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["secret"]).await;
    assert!(result_for(&results, "/inner").is_some());
}

#[tokio::test]
async fn test_redirects_are_reported_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        mangle: false,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["old"]).await;

    let old = result_for(&results, "/old").unwrap();
    assert_eq!(old.status, Some(301));
    assert_eq!(old.redirect.as_ref().unwrap().path(), "/new");
    // 301 is not a spider code by default
    assert!(result_for(&results, "/new").is_none());

    let settings = borer::ScanSettings {
        mangle: false,
        spider_codes: BTreeSet::from([200, 301]),
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["old"]).await;
    assert_eq!(result_for(&results, "/new").unwrap().provenance, Provenance::Discovered);
}

#[tokio::test]
async fn test_head_probes_do_not_spider() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/linked">x</a>"#.to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        method: ProbeMethod::Head,
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &[]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].method, ProbeMethod::Head);
    assert_eq!(results[0].status, Some(200));
}

#[tokio::test]
async fn test_excluded_paths_never_probed() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/logout">out</a><a href="/about">about</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = borer::ScanSettings {
        exclude: vec!["/logout".to_string()],
        ..create_test_settings(&base_url)
    };
    let (_, results) = run_scan(settings, &["logout"]).await;
    let paths: Vec<&str> = results.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/", "/about"]);
}

#[tokio::test]
async fn test_unreachable_host_reports_error() {
    // Nothing listens on port 1
    let settings = borer::ScanSettings {
        timeout: 2_000,
        ..create_test_settings("http://127.0.0.1:1/")
    };
    let (summary, results) = run_scan(settings, &[]).await;

    assert_eq!(results.len(), 1);
    let error = results[0].error.as_ref().expect("transport error recorded");
    assert!(matches!(error.kind, ProbeErrorKind::Connect | ProbeErrorKind::Timeout));
    assert_eq!(summary.errors, 1);
}
