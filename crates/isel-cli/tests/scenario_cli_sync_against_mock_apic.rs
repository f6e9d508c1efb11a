//! End-to-end `isel sync` runs against a mock controller.

use assert_cmd::prelude::*;
use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process::Command;

const CSV: &str = "\
interface_profile;selector_name;fromPort;toPort;description
LF1101;Eth1-01;1;1;uplink
LF1101;Eth1-02;2;2;server
";

fn mock_login(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/api/aaaLogin.json");
        then.status(200)
            .json_body(json!({"imdata": [{"aaaLogin": {"attributes": {"token": "tok"}}}]}));
    })
}

fn mock_existing(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/node/class/infraHPortS.json")
            .header("Cookie", "APIC-cookie=tok");
        then.status(200).json_body(json!({"imdata": [
            {"infraHPortS": {"attributes": {
                "dn": "uni/infra/accportprof-LF1101/hports-Eth1-01-typ-range",
                "name": "Eth1-01"
            }}}
        ]}));
    })
}

fn mock_push(server: &MockServer, status: u16) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/node/mo/uni/infra/accportprof-LF1101.xml")
            .header("Content-Type", "application/xml");
        then.status(status).body(r#"{"imdata":[]}"#);
    })
}

fn sync_cmd(dir: &Path, server: &MockServer) -> Command {
    let csv = dir.join("selectors.csv");
    std::fs::write(&csv, CSV).unwrap();

    let mut cmd = Command::cargo_bin("isel").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env("ISEL_APIC_USERNAME", "admin")
        .env("ISEL_APIC_PASSWORD", "pw")
        .args(["sync", "--apic", &server.base_url(), "--csv"])
        .arg(&csv)
        .arg("--report-dir")
        .arg(dir.join("reports"));
    cmd
}

fn report_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.join("reports"))
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn dry_run_skips_existing_and_simulates_the_rest() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_login(&server);
    mock_existing(&server);
    let push = mock_push(&server, 200);

    let mut cmd = sync_cmd(dir.path(), &server);
    cmd.arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Skipped: selector 'Eth1-01' already exists under profile 'LF1101'",
        ))
        .stdout(predicate::str::contains(
            "Pushed: selector 'Eth1-02' under profile 'LF1101' (dry run)",
        ))
        .stdout(predicate::str::contains("Skipped selectors: LF1101:Eth1-01"))
        .stdout(predicate::str::contains("Summary report saved to"))
        .stderr(predicate::str::contains(
            "[DRY RUN] Would push config for LF1101",
        ));

    assert_eq!(push.hits(), 0);
    let files = report_files(dir.path());
    assert_eq!(files.len(), 2, "{files:?}");
    assert!(files.iter().any(|f| f.ends_with(".log")));
    assert!(files.iter().any(|f| f.ends_with(".json")));
}

#[test]
fn live_run_pushes_only_missing_selector() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_login(&server);
    mock_existing(&server);
    let push = server.mock(|when, then| {
        when.method(POST)
            .path("/api/node/mo/uni/infra/accportprof-LF1101.xml")
            .body_contains(r#"name="Eth1-02""#);
        then.status(200).body(r#"{"imdata":[]}"#);
    });

    sync_cmd(dir.path(), &server)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Pushed: selector 'Eth1-02' under profile 'LF1101'",
        ));

    push.assert_hits(1);
}

#[test]
fn rejected_push_completes_batch_with_exit_two() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_login(&server);
    mock_existing(&server);
    mock_push(&server, 400);

    sync_cmd(dir.path(), &server)
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "Failed: selector 'Eth1-02' under profile 'LF1101': HTTP 400",
        ))
        .stdout(predicate::str::contains(" Failed: 1"));

    assert_eq!(report_files(dir.path()).len(), 2);
}

#[test]
fn rejected_login_exits_one() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(POST).path("/api/aaaLogin.json");
        then.status(401).json_body(json!({"imdata": [{"error": {"attributes": {
            "code": "401", "text": "Username or password is incorrect"
        }}}]}));
    });
    let push = mock_push(&server, 200);

    sync_cmd(dir.path(), &server)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Authentication failed"));

    assert_eq!(push.hits(), 0);
    assert!(report_files(dir.path()).is_empty());
}

#[test]
fn unreadable_snapshot_halts_unless_degrade_is_allowed() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    mock_login(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/node/class/infraHPortS.json");
        then.status(500).body("internal error");
    });
    let push = mock_push(&server, 200);

    sync_cmd(dir.path(), &server)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refusing to apply blind"));
    assert_eq!(push.hits(), 0);

    sync_cmd(dir.path(), &server)
        .arg("--allow-empty-state")
        .assert()
        .success();
    // Both rows, including the one that really exists, were pushed.
    assert_eq!(push.hits(), 2);
}
