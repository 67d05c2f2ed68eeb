use std::error::Error as _;
use std::sync::Arc;

use mock_airtable::MockAirtable;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use whatsub_core::{MemoryDiagnostics, RequestDescriptor, TableRecordsFetcher, WhatsubError};

const TOKEN: &str = "patMockToken";
const BASE: &str = "appWhatsubBase";

async fn spawn_mock(mock: &MockAirtable) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = mock.clone();
    tokio::spawn(async move {
        mock_airtable::run(listener, server).await.unwrap();
    });
    format!("http://{addr}")
}

fn fetcher() -> (Arc<MemoryDiagnostics>, TableRecordsFetcher) {
    let sink = Arc::new(MemoryDiagnostics::new());
    let fetcher = TableRecordsFetcher::new(sink.clone()).unwrap();
    (sink, fetcher)
}

fn completed_reports(sink: &MemoryDiagnostics) -> usize {
    sink.lines()
        .iter()
        .filter(|line| line.starts_with("completed:"))
        .count()
}

fn failed_reports(sink: &MemoryDiagnostics) -> usize {
    sink.lines()
        .iter()
        .filter(|line| line.starts_with("failed:"))
        .count()
}

#[tokio::test]
async fn fetch_delivers_the_records_listing() {
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    mock.seed_records("tblUsers", vec![json!({ "Email": "mina@example.com" })])
        .await;
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblUsers")
        .unwrap()
        .bearer(TOKEN)
        .header("Content-Type", "application/json");
    let (sink, fetcher) = fetcher();

    let outcome = fetcher.fetch_records(&descriptor).await.unwrap();
    assert_eq!(outcome.status, 200);
    assert!(outcome.body.contains("mina@example.com"));
    assert_eq!(completed_reports(&sink), 1);
    assert_eq!(failed_reports(&sink), 0);
}

#[tokio::test]
async fn response_headers_are_captured() {
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblUsers")
        .unwrap()
        .bearer(TOKEN);
    let (_, fetcher) = fetcher();

    let outcome = fetcher.fetch_records(&descriptor).await.unwrap();
    let content_type = outcome
        .headers
        .iter()
        .find(|(name, _)| name == "content-type")
        .map(|(_, value)| value.as_str());
    assert_eq!(content_type, Some("application/json"));
}

#[tokio::test]
async fn rejected_token_is_an_outcome_not_an_error() {
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblUsers")
        .unwrap()
        .bearer("patExpiredToken");
    let (sink, fetcher) = fetcher();

    let outcome = fetcher.fetch_records(&descriptor).await.unwrap();
    assert_eq!(outcome.status, 401);
    assert!(outcome.body.contains("AUTHENTICATION_REQUIRED"));
    assert_eq!(completed_reports(&sink), 1);
    assert_eq!(failed_reports(&sink), 0);
}

#[tokio::test]
async fn unknown_table_is_an_outcome_not_an_error() {
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblGone")
        .unwrap()
        .bearer(TOKEN);
    let (sink, fetcher) = fetcher();

    let outcome = fetcher.fetch_records(&descriptor).await.unwrap();
    assert_eq!(outcome.status, 404);
    assert!(outcome.body.contains("TABLE_NOT_FOUND"));
    assert_eq!(completed_reports(&sink), 1);
}

#[tokio::test]
async fn unresolvable_host_reports_one_failure() {
    // RFC 2606 reserves .invalid, so resolution always fails
    let descriptor =
        RequestDescriptor::new("whatsub-mock.invalid", "/v0/appWhatsubBase/tblUsers").bearer(TOKEN);
    let (sink, fetcher) = fetcher();

    let error = fetcher.fetch_records(&descriptor).await.unwrap_err();
    assert!(matches!(error, WhatsubError::Transport { .. }));
    assert!(error.source().is_some());
    assert_eq!(failed_reports(&sink), 1);
    assert_eq!(completed_reports(&sink), 0);
}

#[tokio::test]
async fn missing_credential_fails_before_any_io() {
    let descriptor = RequestDescriptor::new("whatsub-mock.invalid", "/v0/appWhatsubBase/tblUsers");
    let (sink, fetcher) = fetcher();

    let error = fetcher.fetch_records(&descriptor).await.unwrap_err();
    assert!(matches!(error, WhatsubError::InvalidDescriptor { .. }));
    assert_eq!(failed_reports(&sink), 1);
}

#[tokio::test]
async fn repeated_fetch_delivers_the_same_listing() {
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    mock.seed_records("tblUsers", vec![json!({ "Email": "same@example.com" })])
        .await;
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblUsers")
        .unwrap()
        .bearer(TOKEN);
    let (sink, fetcher) = fetcher();

    let first = fetcher.fetch_records(&descriptor).await.unwrap();
    let second = fetcher.fetch_records(&descriptor).await.unwrap();
    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);
    assert_eq!(completed_reports(&sink), 2);
}

#[tokio::test]
async fn large_body_arrives_complete_and_in_order() {
    // well past any single read chunk
    let big: String = (0..32_000).map(|i| format!("{i:07}")).collect();
    let mock = MockAirtable::new(TOKEN, BASE, &["tblUsers"]);
    mock.seed_records("tblUsers", vec![json!({ "Notes": big.clone() })])
        .await;
    let origin = spawn_mock(&mock).await;

    let descriptor = RequestDescriptor::from_origin(&origin, "/v0/appWhatsubBase/tblUsers")
        .unwrap()
        .bearer(TOKEN);
    let (_, fetcher) = fetcher();

    let outcome = fetcher.fetch_records(&descriptor).await.unwrap();
    assert_eq!(outcome.status, 200);
    let parsed: Value = serde_json::from_str(&outcome.body).unwrap();
    assert_eq!(parsed["records"][0]["fields"]["Notes"], Value::String(big));
}
