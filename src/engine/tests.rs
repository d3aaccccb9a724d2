//! Tests for engine module

use super::*;
use crate::catalog::{CatalogEntry, ConfiguredCatalog};
use crate::error::Error;
use crate::sink::{MemorySink, Message};
use crate::streams::StreamStats;
use crate::transport::MockTransport;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn settings() -> SyncSettings {
    SyncSettings::new(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())
        .with_now(Utc.with_ymd_and_hms(2019, 1, 3, 0, 0, 0).unwrap())
        .with_batch_size(100)
}

fn select(catalog: &StreamCatalog, streams: &[&str]) -> ConfiguredCatalog {
    ConfiguredCatalog {
        streams: streams
            .iter()
            .map(|name| CatalogEntry::from_descriptor(catalog.get(name).unwrap()).selected())
            .collect(),
    }
}

// ============================================================================
// SyncStats Tests
// ============================================================================

#[test]
fn test_sync_stats_aggregation() {
    let mut stats = SyncStats::new();
    let stream = StreamStats {
        records: 10,
        schema_mismatches: 1,
        missing_replication_key: 2,
        windows: 3,
        pages: 4,
    };
    stats.add_stream(&stream);
    stats.add_failure(&StreamStats {
        records: 5,
        ..StreamStats::default()
    });

    assert_eq!(stats.streams_synced, 1);
    assert_eq!(stats.streams_failed, 1);
    assert_eq!(stats.records_synced, 15);
    assert_eq!(stats.schema_mismatches, 1);
    assert_eq!(stats.missing_replication_key, 2);
    assert_eq!(stats.pages_fetched, 4);
    assert_eq!(stats.windows, 3);
}

#[test]
fn test_report_success() {
    let mut report = SyncReport::default();
    assert!(report.is_success());
    report.failures.push(StreamFailure {
        stream: "emails".to_string(),
        cause: "boom".to_string(),
    });
    assert!(!report.is_success());
    assert_eq!(report.failures[0].to_string(), "emails: boom");
}

// ============================================================================
// Check
// ============================================================================

#[tokio::test]
async fn test_check_retrieves_one_folder() {
    let transport = MockTransport::new().with_table("DataFolder", vec![json!({"ID": "1"}), json!({"ID": "2"})]);
    let engine = SyncEngine::new(&transport, settings());
    engine.check().await.unwrap();

    let requests = transport.requests_for("DataFolder");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].batch_size, Some(1));
}

#[tokio::test]
async fn test_check_surfaces_auth_failure() {
    let transport = MockTransport::new().with_error("DataFolder", Error::auth("invalid client"));
    let engine = SyncEngine::new(&transport, settings());
    assert!(matches!(engine.check().await, Err(Error::Authentication { .. })));
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_sync_writes_schema_before_records_and_state_after() {
    let transport = MockTransport::new().with_table(
        "List",
        vec![json!({"ID": "1", "ListName": "All", "ModifiedDate": "2019-01-01T05:00:00Z"})],
    );
    let catalog = StreamCatalog::known().unwrap();
    let engine = SyncEngine::new(&transport, settings());

    let mut state = SyncState::new();
    let mut sink = MemorySink::new();
    let report = engine
        .sync(&catalog, &select(&catalog, &["lists"]), &mut state, &mut sink)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.stats.streams_synced, 1);
    assert_eq!(report.stats.records_synced, 1);

    let messages = sink.messages();
    let first_schema = messages.iter().position(Message::is_schema).unwrap();
    let first_record = messages.iter().position(Message::is_record).unwrap();
    assert!(first_schema < first_record);
    assert!(messages.last().unwrap().is_state());

    assert_eq!(state.currently_syncing, None);
    assert_eq!(
        state.bookmark("lists").unwrap().last_record,
        "2019-01-01T05:00:00Z"
    );
    assert_eq!(sink.schema_streams(), vec!["lists"]);
}

#[tokio::test]
async fn test_stream_failure_does_not_stop_the_run() {
    let transport = MockTransport::new()
        .with_error(
            "Email",
            Error::IncompatibleFieldSelection {
                object_type: "Email".to_string(),
                message: "Invalid column name".to_string(),
            },
        )
        .with_table("List", vec![json!({"ID": "1", "ModifiedDate": "2019-01-02T05:00:00Z"})]);
    let catalog = StreamCatalog::known().unwrap();
    let engine = SyncEngine::new(&transport, settings());

    let mut state = SyncState::new();
    let mut sink = MemorySink::new();
    let report = engine
        .sync(&catalog, &select(&catalog, &["emails", "lists"]), &mut state, &mut sink)
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stream, "emails");
    assert!(report.failures[0].cause.contains("Invalid column name"));
    assert_eq!(report.stats.streams_synced, 1);
    assert_eq!(sink.records("lists").len(), 1);
    assert!(state.bookmark("emails").is_none());
    assert!(state.bookmark("lists").is_some());

    // the failed stream was still announced as in flight
    assert!(sink
        .states()
        .iter()
        .any(|s| s.currently_syncing.as_deref() == Some("emails")));
}

#[tokio::test]
async fn test_fatal_error_aborts_the_run() {
    let transport = MockTransport::new()
        .with_error(
            "Email",
            Error::SoapApi {
                message: "connection reset".to_string(),
                attempts: 5,
            },
        )
        .with_table("List", vec![json!({"ID": "1", "ModifiedDate": "2019-01-02T05:00:00Z"})]);
    let catalog = StreamCatalog::known().unwrap();
    let engine = SyncEngine::new(&transport, settings());

    let mut state = SyncState::new();
    let mut sink = MemorySink::new();
    let err = engine
        .sync(&catalog, &select(&catalog, &["emails", "lists"]), &mut state, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SoapApi { attempts: 5, .. }));
    assert_eq!(state.currently_syncing.as_deref(), Some("emails"));
    assert!(sink.records("lists").is_empty());
}

#[tokio::test]
async fn test_unselected_streams_are_skipped() {
    let transport = MockTransport::new()
        .with_table("List", vec![json!({"ID": "1", "ModifiedDate": "2019-01-02T05:00:00Z"})]);
    let catalog = StreamCatalog::known().unwrap();
    let engine = SyncEngine::new(&transport, settings());

    let selection = ConfiguredCatalog::from_streams(&catalog);
    let mut sink = MemorySink::new();
    let report = engine
        .sync(&catalog, &selection, &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(report.stats.streams_synced, 0);
    assert!(transport.retrieve_requests().is_empty());
    assert!(sink.schema_streams().is_empty());
}

#[tokio::test]
async fn test_missing_selected_stream_is_reported() {
    let transport = MockTransport::new();
    let catalog = StreamCatalog::known().unwrap();
    let engine = SyncEngine::new(&transport, settings());

    let mut entry = CatalogEntry::from_descriptor(catalog.get("lists").unwrap()).selected();
    entry.tap_stream_id = "data_extension.gone".to_string();
    let selection = ConfiguredCatalog {
        streams: vec![entry],
    };

    let report = engine
        .sync(&catalog, &selection, &mut SyncState::new(), &mut MemorySink::new())
        .await
        .unwrap();
    assert_eq!(report.failures[0].stream, "data_extension.gone");
}

#[tokio::test]
async fn test_sync_selected_discovers_when_needed() {
    let transport = MockTransport::new()
        .with_table(
            "DataExtensionField",
            vec![json!({"Name": "Code", "FieldType": "Text", "IsPrimaryKey": "true", "DataExtension": {"CustomerKey": "codes"}})],
        )
        .with_table("DataExtension", vec![json!({"CustomerKey": "codes", "Name": "Codes", "CategoryID": "5"})])
        .with_table(
            "DataExtensionObject[codes]",
            vec![json!({"Properties": {"Property": [
                {"Name": "_CustomObjectKey", "Value": "1"},
                {"Name": "Code", "Value": "A"}
            ]}})],
        );
    let engine = SyncEngine::new(&transport, settings());

    let discovered = engine.discover().await.unwrap();
    let selection = select(&discovered, &["data_extension.codes"]);

    let mut sink = MemorySink::new();
    let report = engine
        .sync_selected(&selection, &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        serde_json::Value::Object(sink.records("data_extension.codes")[0].clone()),
        json!({"_CustomObjectKey": "1", "Code": "A", "CategoryID": 5})
    );
}
