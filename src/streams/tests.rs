//! Stream tests

use super::*;
use crate::config::BookmarkGranularity;
use crate::error::Error;
use crate::sink::MemorySink;
use crate::soap::{RetrieveResponse, SearchFilter};
use crate::state::SyncState;
use crate::transport::MockTransport;
use crate::types::ReplicationMethod;
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashSet;

fn descriptor(name: &str) -> StreamDescriptor {
    known_streams()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap()
}

fn settings() -> SyncSettings {
    SyncSettings::new(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())
        .with_now(Utc.with_ymd_and_hms(2019, 1, 4, 0, 0, 0).unwrap())
        .with_batch_size(2)
}

fn email(id: u32, modified: &str) -> Value {
    json!({"ID": id.to_string(), "Name": format!("email {id}"), "ModifiedDate": modified})
}

fn ids(sink: &MemorySink, stream: &str) -> Vec<i64> {
    sink.records(stream)
        .iter()
        .filter_map(|r| r["ID"].as_i64())
        .collect()
}

// ============================================================================
// Descriptors
// ============================================================================

#[test]
fn test_known_streams_are_valid() {
    let streams = known_streams();
    let names: HashSet<&str> = streams.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names.len(), streams.len());

    for stream in &streams {
        stream.validate().unwrap();
        if let Some(key) = stream.replication_key() {
            assert!(stream.valid_replication_keys.iter().any(|k| k == key));
        }
    }

    assert_eq!(descriptor("campaigns").replication_method(), ReplicationMethod::FullTable);
    assert_eq!(descriptor("open_events").replication_key(), Some("EventDate"));
    assert_eq!(descriptor("folders").object_reference(), "DataFolder");
}

#[test]
fn test_remote_properties_follow_rules() {
    let sends = descriptor("sends");
    assert_eq!(
        sends.remote_properties(&["ID", "EmailID", "Unknown", "ID"]),
        vec!["ID".to_string(), "Email.ID".to_string()]
    );
}

#[test]
fn test_constant_fields_are_not_requested() {
    let descriptor = StreamDescriptor::new(
        "data_extension.x",
        Source::DataExtension {
            customer_key: "x-key".to_string(),
        },
        crate::schema::JsonSchema::new()
            .with("Name", crate::schema::SchemaProperty::string())
            .with("CategoryID", crate::schema::SchemaProperty::integer()),
    )
    .with_rule(crate::transform::FieldRule::PropertyBag)
    .with_rule(crate::transform::FieldRule::constant("CategoryID", 9));

    assert_eq!(descriptor.object_reference(), "DataExtensionObject[x-key]");
    assert_eq!(descriptor.remote_properties(&["Name", "CategoryID"]), vec!["Name"]);
}

#[test]
fn test_validate_rejects_unfilterable_replication_key() {
    let rest = descriptor("campaigns").incremental("modifiedDate");
    assert!(matches!(rest.validate(), Err(Error::Catalog { .. })));

    let not_a_date = descriptor("emails").incremental("Name");
    assert!(not_a_date.validate().is_err());

    let bad_key = descriptor("emails").with_keys(&["Nope"]);
    assert!(bad_key.validate().is_err());
}

#[test]
fn test_selection_always_includes_automatic_fields() {
    let emails = descriptor("emails");
    let sync = StreamSync::new(&emails, &["Name"]);
    let fields: Vec<&str> = sync.schema().field_names().collect();
    assert_eq!(fields, vec!["ID", "ModifiedDate", "Name"]);
    assert_eq!(sync.properties(), &["ID", "ModifiedDate", "Name"]);
    assert_eq!(sync.phase(), StreamPhase::Start);
}

// ============================================================================
// Full table
// ============================================================================

#[tokio::test]
async fn test_full_table_sync_is_idempotent() {
    let rows: Vec<Value> = (1..=5)
        .map(|i| json!({"List": {"ID": "7"}, "SendID": i.to_string(), "NumberSent": "10"}))
        .collect();
    let transport = MockTransport::new().with_table("ListSend", rows);
    let list_sends = descriptor("list_sends");

    for _ in 0..2 {
        let mut state = SyncState::new();
        let mut sink = MemorySink::new();
        let mut sync = StreamSync::all_fields(&list_sends);
        let stats = sync.sync(&transport, &settings(), &mut state, &mut sink).await.unwrap();

        assert_eq!(stats.records, 5);
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.windows, 0);
        assert!(state.bookmarks.is_empty());
        assert!(sink.states().is_empty());
        assert_eq!(sync.phase(), StreamPhase::Done);
        assert_eq!(
            Value::Object(sink.records("list_sends")[0].clone()),
            json!({"ListID": 7, "SendID": 1, "NumberSent": 10})
        );
    }

    let requests = transport.requests_for("ListSend");
    assert!(requests.iter().all(|r| r.filter.is_none()));
    assert!(requests[0].properties.contains(&"List.ID".to_string()));
}

#[tokio::test]
async fn test_rest_full_table_pages_collection() {
    let items: Vec<Value> = (0..3)
        .map(|i| json!({"id": format!("c{i}"), "name": "Spring", "favorite": "false"}))
        .collect();
    let transport = MockTransport::new().with_collection("/hub/v1/campaigns", items);
    let campaigns = descriptor("campaigns");

    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&campaigns)
        .sync(&transport, &settings(), &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.records, 3);
    assert_eq!(sink.records("campaigns")[2]["favorite"], json!(false));
    assert_eq!(transport.page_requests().len(), 2);
}

#[tokio::test]
async fn test_schema_mismatch_is_counted_not_fatal() {
    let rows = vec![
        email(1, "2019-01-01T10:00:00Z"),
        json!({"ID": "not-a-number", "ModifiedDate": "2019-01-01T11:00:00Z"}),
        email(3, "2019-01-01T12:00:00Z"),
    ];
    let transport = MockTransport::new().with_table("Email", rows);
    let emails = descriptor("emails");

    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.records, 2);
    assert_eq!(stats.schema_mismatches, 1);
    assert_eq!(ids(&sink, "emails"), vec![1, 3]);
}

// ============================================================================
// Incremental
// ============================================================================

#[tokio::test]
async fn test_incremental_walks_windows_and_bookmarks_max() {
    let rows = vec![
        email(1, "2019-01-01T06:00:00Z"),
        email(2, "2019-01-03T06:00:00Z"),
        email(3, "2019-01-02T06:00:00Z"),
        email(4, "2018-12-30T06:00:00Z"),
    ];
    let transport = MockTransport::new().with_table("Email", rows);
    let emails = descriptor("emails");

    let mut state = SyncState::new();
    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut state, &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.windows, 3);
    assert_eq!(stats.records, 3);
    assert_eq!(ids(&sink, "emails"), vec![1, 3, 2]);
    assert_eq!(
        state.bookmark("emails").unwrap().last_record,
        "2019-01-03T06:00:00Z"
    );

    // one checkpoint per window; the bookmark only moves at the end
    let checkpoints = sink.states();
    assert_eq!(checkpoints.len(), 3);
    assert!(checkpoints.iter().all(|s| s.bookmark("emails").is_none()));

    let requests = transport.requests_for("Email");
    let day = |d| Utc.with_ymd_and_hms(2019, 1, d, 0, 0, 0).unwrap();
    assert_eq!(
        requests[0].filter,
        Some(SearchFilter::window("ModifiedDate", day(1), day(2), false))
    );
    assert_eq!(
        requests.last().unwrap().filter,
        Some(SearchFilter::window("ModifiedDate", day(3), day(4), true))
    );
    assert!(requests.iter().all(|r| r.batch_size == Some(2)));
}

#[tokio::test]
async fn test_boundary_record_emitted_once() {
    let rows = vec![
        email(1, "2019-01-02T00:00:00Z"),
        email(2, "2019-01-03T00:00:00Z"),
        email(3, "2019-01-04T00:00:00Z"),
    ];
    let transport = MockTransport::new().with_table("Email", rows);
    let emails = descriptor("emails");

    let mut state = SyncState::new();
    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut state, &mut sink)
        .await
        .unwrap();

    // the last record sits on the run's end and is still included
    assert_eq!(ids(&sink, "emails"), vec![1, 2, 3]);
    assert_eq!(stats.records, 3);
    assert_eq!(
        state.bookmark("emails").unwrap().last_record,
        "2019-01-04T00:00:00Z"
    );
}

#[tokio::test]
async fn test_incremental_resumes_from_bookmark() {
    let rows = vec![
        email(1, "2019-01-01T06:00:00Z"),
        email(2, "2019-01-03T06:00:00Z"),
    ];
    let transport = MockTransport::new().with_table("Email", rows);
    let emails = descriptor("emails");

    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2019-01-02T12:00:00Z");
    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut state, &mut sink)
        .await
        .unwrap();

    assert_eq!(ids(&sink, "emails"), vec![2]);
    assert_eq!(stats.windows, 2);
    assert_eq!(
        state.bookmark("emails").unwrap().last_record,
        "2019-01-03T06:00:00Z"
    );
}

#[tokio::test]
async fn test_bookmark_never_moves_backwards() {
    let transport = MockTransport::new().with_response(
        "Email",
        RetrieveResponse::ok(vec![email(1, "2019-01-03T06:00:00Z")]),
    );
    let emails = descriptor("emails");

    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2019-02-01T00:00:00Z");
    let mut sink = MemorySink::new();
    StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut state, &mut sink)
        .await
        .unwrap();

    assert_eq!(ids(&sink, "emails"), vec![1]);
    assert_eq!(
        state.bookmark("emails").unwrap().last_record,
        "2019-02-01T00:00:00Z"
    );
}

#[tokio::test]
async fn test_record_without_replication_key_is_skipped() {
    let transport = MockTransport::new().with_response(
        "Email",
        RetrieveResponse::ok(vec![
            json!({"ID": "1", "ModifiedDate": "2019-01-01T03:00:00Z"}),
            json!({"ID": "2"}),
            json!({"ID": "3", "ModifiedDate": null}),
        ]),
    );
    let emails = descriptor("emails");

    let mut sink = MemorySink::new();
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.records, 1);
    assert_eq!(stats.missing_replication_key, 2);
    assert_eq!(ids(&sink, "emails"), vec![1]);
}

#[tokio::test]
async fn test_window_granularity_checkpoints_bookmark() {
    let rows = vec![
        email(1, "2019-01-01T06:00:00Z"),
        email(2, "2019-01-02T06:00:00Z"),
    ];
    let transport = MockTransport::new().with_table("Email", rows);
    let emails = descriptor("emails");
    let run = settings().with_bookmark_granularity(BookmarkGranularity::Window);

    let mut sink = MemorySink::new();
    StreamSync::all_fields(&emails)
        .sync(&transport, &run, &mut SyncState::new(), &mut sink)
        .await
        .unwrap();

    let marks: Vec<Option<String>> = sink
        .states()
        .iter()
        .map(|s| s.bookmark("emails").map(|b| b.last_record.clone()))
        .collect();
    assert_eq!(
        marks,
        vec![
            Some("2019-01-01T06:00:00Z".to_string()),
            Some("2019-01-02T06:00:00Z".to_string()),
            Some("2019-01-02T06:00:00Z".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_degenerate_window_when_bookmark_is_ahead() {
    let transport = MockTransport::new();
    let emails = descriptor("emails");

    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2019-03-01T00:00:00Z");
    let stats = StreamSync::all_fields(&emails)
        .sync(&transport, &settings(), &mut state, &mut MemorySink::new())
        .await
        .unwrap();

    assert_eq!(stats.windows, 1);
    assert_eq!(transport.requests_for("Email").len(), 1);
}

#[tokio::test]
async fn test_remote_error_ends_stream() {
    let transport = MockTransport::new().with_error(
        "Email",
        Error::IncompatibleFieldSelection {
            object_type: "Email".to_string(),
            message: "Invalid column name 'PreHeader'".to_string(),
        },
    );
    let emails = descriptor("emails");

    let mut sync = StreamSync::all_fields(&emails);
    let mut state = SyncState::new();
    let run = settings().with_date_window(Duration::days(10));
    let err = sync
        .sync(&transport, &run, &mut state, &mut MemorySink::new())
        .await
        .unwrap_err();

    assert!(err.is_stream_recoverable());
    assert_eq!(sync.phase(), StreamPhase::Done);
    assert!(state.bookmarks.is_empty());
}
