//! Tests for state module

use super::*;
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

fn ts(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

// ============================================================================
// Bookmark Tests
// ============================================================================

#[test]
fn test_incorporate_keeps_maximum() {
    let mut state = SyncState::new();

    assert!(state.incorporate("folder", "ModifiedDate", "2017-01-01"));
    assert!(state.incorporate("folder", "ModifiedDate", "2017-11-01"));
    assert!(!state.incorporate("folder", "ModifiedDate", "2017-06-01"));

    let bookmark = state.bookmark("folder").unwrap();
    assert_eq!(bookmark.field, "ModifiedDate");
    assert_eq!(bookmark.last_record, "2017-11-01T00:00:00Z");
}

#[test]
fn test_incorporate_compares_normalised_values() {
    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2017-11-01T10:00:00.000+02:00");
    state.incorporate("emails", "ModifiedDate", "2017-11-01T09:00:00Z");

    assert_eq!(state.bookmark("emails").unwrap().last_record, "2017-11-01T09:00:00Z");
}

#[test]
fn test_incorporate_against_loaded_offset_bookmark() {
    // 12:00+05:00 is 07:00Z, so 08:00Z is ahead of it
    let mut state = SyncState::from_json(
        r#"{"bookmarks": {"emails": {"field": "ModifiedDate", "last_record": "2017-11-01T12:00:00+05:00"}}}"#,
    )
    .unwrap();
    assert!(state.incorporate("emails", "ModifiedDate", "2017-11-01T08:00:00Z"));
    assert_eq!(state.bookmark("emails").unwrap().last_record, "2017-11-01T08:00:00Z");
}

#[test]
fn test_incorporate_against_loaded_fractional_bookmark() {
    let mut state = SyncState::from_json(
        r#"{"bookmarks": {"emails": {"field": "ModifiedDate", "last_record": "2017-11-01T08:00:00.900Z"}}}"#,
    )
    .unwrap();
    assert!(!state.incorporate("emails", "ModifiedDate", "2017-11-01T08:00:00Z"));
    assert_eq!(
        state.bookmark("emails").unwrap().last_record,
        "2017-11-01T08:00:00.900Z"
    );
}

#[test]
fn test_incorporate_streams_are_independent() {
    let mut state = SyncState::new();
    state.incorporate("a", "ModifiedDate", "2018-01-01");
    state.incorporate("b", "EventDate", "2017-01-01");

    assert_eq!(state.bookmarks.len(), 2);
    assert_eq!(state.bookmark("b").unwrap().field, "EventDate");
}

#[test]
fn test_resume_point() {
    let mut state = SyncState::new();
    let start = ts(2016, 1, 1);
    assert_eq!(state.resume_point("emails", start), start);

    state.incorporate("emails", "ModifiedDate", "2017-03-04");
    assert_eq!(state.resume_point("emails", start), ts(2017, 3, 4));
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_state_json_format() {
    let mut state = SyncState::new();
    state.incorporate("emails", "ModifiedDate", "2017-11-01");
    state.set_currently_syncing(Some("emails"));

    assert_eq!(
        state.to_value(),
        serde_json::json!({
            "bookmarks": {"emails": {"field": "ModifiedDate", "last_record": "2017-11-01T00:00:00Z"}},
            "currently_syncing": "emails"
        })
    );

    let restored = SyncState::from_json(&serde_json::to_string(&state).unwrap()).unwrap();
    assert_eq!(restored, state);
}

#[test_case("" ; "empty document")]
#[test_case("null" ; "json null")]
#[test_case("{}" ; "empty object")]
fn test_from_json_empty(input: &str) {
    assert_eq!(SyncState::from_json(input).unwrap(), SyncState::new());
}

#[test]
fn test_from_json_invalid() {
    let err = SyncState::from_json("{\"bookmarks\": 3}").unwrap_err();
    assert!(matches!(err, crate::Error::State { .. }));
}

// ============================================================================
// Date Window Tests
// ============================================================================

#[test]
fn test_date_windows_cover_range() {
    let start = ts(2017, 1, 1);
    let end = Utc.with_ymd_and_hms(2017, 1, 4, 12, 0, 0).unwrap();
    let windows = date_windows(start, end, Duration::days(1));

    assert_eq!(windows.len(), 4);
    assert_eq!(windows[0].start, start);
    assert_eq!(windows.last().unwrap().end, end);
    for pair in windows.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test_case(1, 10 ; "daily")]
#[test_case(3, 4 ; "three days")]
#[test_case(30, 1 ; "wider than range")]
fn test_date_windows_count(days: i64, expected: usize) {
    let windows = date_windows(ts(2017, 1, 1), ts(2017, 1, 11), Duration::days(days));
    assert_eq!(windows.len(), expected);
    assert_eq!(windows.last().unwrap().end, ts(2017, 1, 11));
}

#[test]
fn test_date_windows_degenerate() {
    let start = ts(2018, 1, 1);
    let windows = date_windows(start, ts(2017, 1, 1), Duration::days(1));

    assert_eq!(windows, vec![DateWindow { start, end: start }]);
    assert!(windows[0].is_degenerate());
    assert_eq!(date_windows(start, start, Duration::days(1)).len(), 1);
}

// ============================================================================
// StateManager Tests
// ============================================================================

#[tokio::test]
async fn test_state_manager_round_trip() {
    let dir = tempdir().unwrap();
    let manager = StateManager::new(dir.path().join("state.json"));

    assert_eq!(manager.load().unwrap(), SyncState::new());

    let mut state = SyncState::new();
    state.incorporate("subscribers", "ModifiedDate", "2019-05-05T05:05:05Z");
    manager.save(&state).await.unwrap();

    assert_eq!(manager.load().unwrap(), state);
    assert!(!dir.path().join("state.tmp").exists());
}

#[test]
fn test_state_manager_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(StateManager::new(&path).load().is_err());
}
