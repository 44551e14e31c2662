//! Integration tests for full harvest runs
//!
//! These tests use wiremock to serve a small site (pages, PDFs, DOCX files,
//! dead links) and run the whole crawl-extract-export cycle against it.

mod fixtures;

use fixtures::{docx_with_paragraphs, pdf_with_lines};
use shadow_harvester::config::{parse_config, Config, RouteEntry, TransportKind};
use shadow_harvester::crawler::{harvest, RunOutcome};
use shadow_harvester::state::{AbortReason, RunState};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration pointed at the mock server
fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = parse_config(&format!(
        r#"
[target]
url = "{}"
seed-paths = []

[crawler]
max-depth = 3
page-budget = 50
max-concurrent-fetches = 4

[fetch]
timeout-ms = 5000
max-attempts = 2
backoff-base-ms = 10
backoff-max-ms = 50
user-agents = ["TestBot/1.0"]

[output]
path = "placeholder.csv"
"#,
        base_url
    ))
    .expect("test config parses");

    config.output.path = output.display().to_string();
    config
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

fn output_in(dir: &TempDir) -> PathBuf {
    dir.path().join("emails.csv")
}

/// Reads the exported table as (email, first_seen_url, source_urls) rows
fn read_rows(path: &Path) -> Vec<(String, String, String)> {
    let mut reader = csv::Reader::from_path(path).expect("csv exists");
    reader
        .records()
        .map(|r| {
            let r = r.expect("valid row");
            (r[0].to_string(), r[1].to_string(), r[2].to_string())
        })
        .collect()
}

#[tokio::test]
async fn test_page_and_pdf_addresses_are_deduplicated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<html><body>
            <p>contact: a@b.com</p>
            <p>contact: a@b.com</p>
            <a href="/files/staff.pdf">Staff list</a>
        </body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/staff.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(pdf_with_lines(&["Staff", "c@d.com"]), "application/pdf"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&base, &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success(), "outcome: {:?}", report.outcome);
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.addresses_found, 2);
    assert_eq!(report.stats.documents_processed, 1);
    assert_eq!(report.stats.pages_failed, 0);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);

    let (email, first_seen, sources) = &rows[0];
    assert_eq!(email, "a@b.com");
    assert_eq!(first_seen, &format!("{}/", base));
    assert_eq!(sources, &format!("{}/", base));

    let (email, first_seen, sources) = &rows[1];
    assert_eq!(email, "c@d.com");
    assert_eq!(first_seen, &format!("{}/files/staff.pdf", base));
    assert_eq!(sources, &format!("{}/files/staff.pdf", base));
}

#[tokio::test]
async fn test_address_on_several_pages_lists_every_source() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", r#"<p>a@b.com</p><a href="/about">About</a>"#).await;
    mount_html(&server, "/about", "<p>Write to a@b.com</p>").await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&base, &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success());
    let rows = read_rows(&output);
    assert_eq!(rows.len(), 1);

    let (email, first_seen, sources) = &rows[0];
    assert_eq!(email, "a@b.com");
    assert_eq!(first_seen, &format!("{}/", base));
    assert_eq!(sources, &format!("{}/ | {}/about", base, base));
}

#[tokio::test]
async fn test_links_are_requested_as_written() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/team/">Team</a><a href="/file?source=staff">Staff file</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/team/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>lead@team.org</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .and(query_param("source", "staff"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hr@team.org</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&server.uri(), &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success());
    assert_eq!(report.stats.pages_failed, 0);
    assert_eq!(report.stats.pages_visited, 3);

    let emails: Vec<String> = read_rows(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(emails, vec!["hr@team.org", "lead@team.org"]);

    server.verify().await;
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_not_followed() {
    let server = MockServer::start().await;
    let port = server.address().port();

    mount_html(&server, "/", r#"<p>home@site.org</p><a href="/moved">Moved</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("http://localhost:{}/elsewhere", port).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>outside@other.org</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&server.uri(), &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success());
    assert!(report.stats.pages_failed >= 1);

    let emails: Vec<String> = read_rows(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(emails, vec!["home@site.org"]);

    server.verify().await;
}

#[tokio::test]
async fn test_dead_document_counts_as_failed() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<p>owner@site.org</p><a href="/missing.pdf">Gone</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&server.uri(), &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success());
    assert_eq!(report.stats.pages_failed, 1);
    assert_eq!(report.stats.pages_by_state.get("dead_link"), Some(&1));
    assert_eq!(read_rows(&output).len(), 1);

    server.verify().await;
}

#[tokio::test]
async fn test_shared_links_are_fetched_once() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#).await;
    for page in ["/a", "/b", "/c"] {
        mount_html(
            &server,
            page,
            r#"<a href="/shared">S</a><a href="/shared?utm_source=nav">S</a><a href="/">Home</a>"#,
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>shared@team.net</p>", "text/html")
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_in(&dir));
    config.crawler.max_concurrent_fetches = 8;

    let report = harvest(config).await.expect("harvest runs");

    assert!(report.is_success());
    assert_eq!(report.stats.pages_visited, 5);
    assert_eq!(report.stats.addresses_found, 1);

    server.verify().await;
}

#[tokio::test]
async fn test_all_routes_banned_aborts_without_export() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<p>never@reached.com</p>").await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let mut config = create_test_config(&server.uri(), &output);
    config.proxy.routes = vec![RouteEntry {
        kind: TransportKind::Socks,
        address: Some("127.0.0.1:1".to_string()),
    }];
    config.proxy.degraded_after = 1;
    config.proxy.banned_after = 2;
    config.proxy.exhaustion_grace_secs = 1;
    config.proxy.exhaustion_poll_ms = 50;
    config.fetch.max_attempts = 3;

    let report = tokio::time::timeout(Duration::from_secs(20), harvest(config))
        .await
        .expect("run ends within the grace period")
        .expect("harvest runs");

    assert!(matches!(
        report.state,
        RunState::Aborted(AbortReason::ProxyExhausted { .. })
    ));
    assert!(matches!(report.outcome, RunOutcome::Aborted(_)));
    assert!(!report.is_success());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unwritable_destination_fails_export() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<p>someone@company.com</p>").await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("no-such-dir").join("emails.csv");
    let report = harvest(create_test_config(&server.uri(), &output))
        .await
        .expect("harvest runs");

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.addresses_found, 1);
    assert!(matches!(report.outcome, RunOutcome::ExportFailed(_)));
    assert!(!report.is_success());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_failed_json_report_leaves_no_table() {
    let server = MockServer::start().await;
    mount_html(&server, "/", "<p>someone@company.com</p>").await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let mut config = create_test_config(&server.uri(), &output);
    config.output.json_path = Some(
        dir.path()
            .join("no-such-dir")
            .join("report.json")
            .display()
            .to_string(),
    );

    let report = harvest(config).await.expect("harvest runs");

    assert_eq!(report.state, RunState::Completed);
    assert!(matches!(report.outcome, RunOutcome::ExportFailed(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_docx_sniffed_and_robots_respected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("User-agent: *\nDisallow: /private", "text/plain"),
        )
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/",
        r#"<a href="/private/board">Board</a><a href="/download?id=7">CV</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/private/board"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>secret@board.org</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            docx_with_paragraphs(&["Jane Roe", "jane@corp.example"]),
            "application/octet-stream",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let report = harvest(create_test_config(&server.uri(), &output))
        .await
        .expect("harvest runs");

    assert!(report.is_success());
    assert_eq!(report.stats.pages_skipped, 1);
    assert_eq!(report.stats.documents_processed, 1);

    let emails: Vec<String> = read_rows(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(emails, vec!["jane@corp.example"]);

    server.verify().await;
}

#[tokio::test]
async fn test_run_timeout_still_exports() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<p>fast@site.io</p><a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>slow@site.io</p>", "text/html")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = output_in(&dir);
    let mut config = create_test_config(&server.uri(), &output);
    config.crawler.run_timeout_secs = 1;
    config.fetch.timeout_ms = 30_000;

    let report = harvest(config).await.expect("harvest runs");

    assert!(report.stats.timed_out);
    assert_eq!(report.state, RunState::Completed);
    assert!(report.is_success());

    let emails: Vec<String> = read_rows(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(emails, vec!["fast@site.io"]);
}

#[tokio::test]
async fn test_json_report_written_alongside_csv() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<a href="mailto:Press@Media.com?subject=hi">Press</a>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("report.json");
    let mut config = create_test_config(&server.uri(), &output_in(&dir));
    config.output.json_path = Some(json_path.display().to_string());

    let report = harvest(config).await.expect("harvest runs");

    match &report.outcome {
        RunOutcome::Exported(paths) => assert_eq!(paths.len(), 2),
        other => panic!("unexpected outcome: {:?}", other),
    }

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["stats"]["addresses_found"], 1);
    assert_eq!(value["addresses"][0]["email"], "press@media.com");
    assert_eq!(value["addresses"][0]["methods"][0], "mailto_link");
}

#[tokio::test]
async fn test_depth_and_budget_limits() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/1">1</a>"#).await;
    mount_html(&server, "/1", r#"<p>one@depth.com</p><a href="/2">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>two@depth.com</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_in(&dir));
    config.crawler.max_depth = 1;

    let report = harvest(config).await.expect("harvest runs");

    assert_eq!(report.stats.pages_visited, 2);
    assert_eq!(report.stats.addresses_found, 1);
    server.verify().await;
}
