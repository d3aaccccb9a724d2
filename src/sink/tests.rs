//! Sink tests

use super::*;
use crate::schema::{JsonSchema, SchemaProperty};
use crate::state::SyncState;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn schema() -> JsonSchema {
    JsonSchema::new()
        .with("ID", SchemaProperty::integer())
        .with("ModifiedDate", SchemaProperty::date_time())
}

fn record(value: Value) -> crate::types::JsonObject {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_json_lines_output() {
    let mut sink = JsonLinesSink::new(Vec::new());
    let keys = vec!["ID".to_string()];
    sink.write_schema("emails", &schema(), &keys, Some("ModifiedDate"))
        .unwrap();
    sink.write_record("emails", record(json!({"ID": 1}))).unwrap();

    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2019-01-01T00:00:00Z");
    sink.write_state(&state).unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["type"], "SCHEMA");
    assert_eq!(lines[0]["key_properties"], json!(["ID"]));
    assert_eq!(lines[0]["bookmark_properties"], json!(["ModifiedDate"]));
    assert_eq!(lines[0]["schema"]["properties"]["ID"]["type"], json!(["null", "integer"]));

    assert_eq!(lines[1]["type"], "RECORD");
    assert_eq!(lines[1]["record"], json!({"ID": 1}));
    assert!(lines[1]["time_extracted"].is_string());

    assert_eq!(
        lines[2],
        json!({
            "type": "STATE",
            "value": {
                "bookmarks": {"emails": {"field": "ModifiedDate", "last_record": "2019-01-01T00:00:00Z"}},
                "currently_syncing": null
            }
        })
    );
}

#[test]
fn test_full_table_schema_has_no_bookmark_properties() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.write_schema("campaigns", &schema(), &["ID".to_string()], None)
        .unwrap();
    let output = String::from_utf8(sink.into_inner()).unwrap();
    let line: Value = serde_json::from_str(output.trim()).unwrap();
    assert!(line.get("bookmark_properties").is_none());
}

#[test]
fn test_message_round_trip() {
    let message: Message = serde_json::from_value(json!({
        "type": "RECORD",
        "stream": "lists",
        "record": {"ID": 3}
    }))
    .unwrap();
    assert!(message.is_record());
    assert_eq!(message.stream(), Some("lists"));
    assert!(Message::state(json!({})).stream().is_none());
}

#[test]
fn test_memory_sink_helpers() {
    let mut sink = MemorySink::new();
    sink.write_schema("lists", &schema(), &[], None).unwrap();
    sink.write_record("lists", record(json!({"ID": 1}))).unwrap();
    sink.write_record("sends", record(json!({"ID": 2}))).unwrap();
    sink.write_record("lists", record(json!({"ID": 3}))).unwrap();

    let mut state = SyncState::new();
    sink.write_state(&state).unwrap();
    state.set_currently_syncing(Some("sends"));
    sink.write_state(&state).unwrap();

    let ids: Vec<&Value> = sink.records("lists").iter().map(|r| &r["ID"]).collect();
    assert_eq!(ids, vec![&json!(1), &json!(3)]);
    assert_eq!(sink.schema_streams(), vec!["lists"]);
    assert_eq!(sink.states().len(), 2);
    assert_eq!(
        sink.last_state().unwrap().currently_syncing.as_deref(),
        Some("sends")
    );
    assert_eq!(sink.messages().len(), 6);
}
