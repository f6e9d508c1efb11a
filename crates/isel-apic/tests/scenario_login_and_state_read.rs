//! Login and selector snapshot against a mock controller.

use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use isel_apic::{ApicClient, ApicError, ApicSession, ClientOptions, Credentials, StateReader};
use isel_reconcile::{resolve_snapshot, StateFetchPolicy};
use serde_json::json;

fn client(server: &MockServer) -> ApicClient {
    ApicClient::new(&server.base_url(), &ClientOptions::default()).unwrap()
}

fn login_ok(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/aaaLogin.json")
            .json_body(json!({"aaaUser":{"attributes":{"name":"admin","pwd":"pw"}}}));
        then.status(200).json_body(json!({
            "totalCount": "1",
            "imdata": [{"aaaLogin": {"attributes": {"token": "tok-1"}}}]
        }));
    })
}

#[test]
fn login_then_snapshot_groups_selectors_and_drops_foreign_dns() {
    let server = MockServer::start();
    let login = login_ok(&server);
    let query = server.mock(|when, then| {
        when.method(GET)
            .path("/api/node/class/infraHPortS.json")
            .header("Cookie", "APIC-cookie=tok-1");
        then.status(200).json_body(json!({
            "imdata": [
                {"infraHPortS": {"attributes": {"dn": "uni/infra/accportprof-LF1101/hports-Eth1-01-typ-range", "name": "Eth1-01"}}},
                {"infraHPortS": {"attributes": {"dn": "uni/infra/accportprof-LF1101/hports-Eth1-02-typ-range", "name": "Eth1-02"}}},
                {"infraHPortS": {"attributes": {"dn": "uni/infra/accportprof-LF1102/hports-Eth1-01-typ-range", "name": "Eth1-01"}}},
                {"infraHPortS": {"attributes": {"dn": "uni/infra/fexprof-FEX101/hports-Eth1-09-typ-range", "name": "Eth1-09"}}}
            ]
        }));
    });

    let session = client(&server)
        .login(&Credentials::new("admin", "pw"))
        .unwrap();
    let index = StateReader::new(&session).fetch_existing().unwrap();

    login.assert();
    query.assert();
    assert_eq!(index.profile_count(), 2);
    assert_eq!(index.selector_count(), 3);
    assert!(index.contains("LF1101", "Eth1-02"));
    assert!(index.contains("LF1102", "Eth1-01"));
    assert!(!index.contains("LF1102", "Eth1-02"));
}

#[test]
fn rejected_login_is_an_http_error_with_envelope_text() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST).path("/api/aaaLogin.json");
        then.status(401).json_body(json!({
            "imdata": [{"error": {"attributes": {"code": "401", "text": "Username or password is incorrect"}}}]
        }));
    });

    let err = client(&server)
        .login(&Credentials::new("admin", "wrong"))
        .unwrap_err();

    login.assert();
    assert_eq!(
        err,
        ApicError::Http {
            status: 401,
            message: "code 401: Username or password is incorrect".to_string()
        }
    );
}

#[test]
fn login_without_token_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/aaaLogin.json");
        then.status(200).json_body(json!({"imdata": []}));
    });

    let err = client(&server)
        .login(&Credentials::new("admin", "pw"))
        .unwrap_err();
    assert!(matches!(err, ApicError::Decode(_)));
}

#[test]
fn failed_class_query_surfaces_as_error() {
    let server = MockServer::start();
    login_ok(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/node/class/infraHPortS.json");
        then.status(403).json_body(json!({
            "imdata": [{"error": {"attributes": {"code": "403", "text": "Token was invalid"}}}]
        }));
    });

    let session = client(&server)
        .login(&Credentials::new("admin", "pw"))
        .unwrap();
    let err = StateReader::new(&session).fetch_existing().unwrap_err();
    assert!(matches!(err, ApicError::Http { status: 403, .. }));
}

#[test]
fn slow_class_query_times_out_and_feeds_the_snapshot_gate() {
    let server = MockServer::start();
    let query = server.mock(|when, then| {
        when.method(GET).path("/api/node/class/infraHPortS.json");
        then.status(200)
            .json_body(json!({"imdata": []}))
            .delay(Duration::from_secs(3));
    });

    let opts = ClientOptions {
        timeout: Duration::from_millis(300),
        ..ClientOptions::default()
    };
    let client = ApicClient::new(&server.base_url(), &opts).unwrap();
    let session = ApicSession::with_token(client, "tok-1");

    let fetched = StateReader::new(&session).fetch_existing();
    assert!(matches!(fetched, Err(ApicError::Transport(_))), "got {fetched:?}");
    assert_eq!(query.hits(), 1);

    let refused = resolve_snapshot(fetched.clone(), StateFetchPolicy::Halt).unwrap_err();
    assert!(refused.detail.contains("apic transport error"));

    let snap = resolve_snapshot(fetched, StateFetchPolicy::DegradeToEmpty).unwrap();
    assert!(snap.is_degraded());
    assert!(snap.index.is_empty());
}
