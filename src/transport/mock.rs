//! In-memory transport
//!
//! Serves scripted responses or canned tables without touching the network.
//! Used by the engine tests and handy for dry runs against fixture data.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = MockTransport::new()
//!     .with_table("Email", vec![json!({"ID": "1", "ModifiedDate": "2017-01-01T00:00:00Z"})])
//!     .with_error("Send", Error::remote("Error: boom"));
//! ```

use super::types::{PageInfo, PageParams, RestPage, Transport};
use crate::error::{Error, Result};
use crate::soap::{
    FilterValue, LogicalOperator, RetrieveRequest, RetrieveResponse, SearchFilter, SimpleOperator,
};
use crate::types::parse_datetime;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

const CONTINUATION_PREFIX: &str = "mock-offset-";

/// Transport backed by scripted responses and in-memory tables
#[derive(Debug, Default)]
pub struct MockTransport {
    scripted: Mutex<HashMap<String, VecDeque<Result<RetrieveResponse>>>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    scripted_pages: Mutex<HashMap<String, VecDeque<Result<RestPage>>>>,
    collections: Mutex<HashMap<String, Vec<Value>>>,
    retrieve_log: Mutex<Vec<RetrieveRequest>>,
    page_log: Mutex<Vec<(String, PageParams)>>,
}

impl MockTransport {
    /// Create an empty transport; unknown objects answer with no records
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` for `object_type`, honoring filters and batch sizes
    #[must_use]
    pub fn with_table(self, object_type: impl Into<String>, records: Vec<Value>) -> Self {
        self.tables.lock().insert(object_type.into(), records);
        self
    }

    /// Queue one scripted response for `object_type`; queued responses win
    /// over tables until they run out
    #[must_use]
    pub fn with_response(self, object_type: impl Into<String>, response: RetrieveResponse) -> Self {
        self.push(object_type.into(), Ok(response));
        self
    }

    /// Queue one failure for `object_type`
    #[must_use]
    pub fn with_error(self, object_type: impl Into<String>, error: Error) -> Self {
        self.push(object_type.into(), Err(error));
        self
    }

    /// Serve `items` for a REST endpoint, paged by the requested page size
    #[must_use]
    pub fn with_collection(self, endpoint: impl Into<String>, items: Vec<Value>) -> Self {
        self.collections.lock().insert(endpoint.into(), items);
        self
    }

    /// Queue one scripted REST page (or failure) for `endpoint`
    #[must_use]
    pub fn with_page(self, endpoint: impl Into<String>, page: Result<RestPage>) -> Self {
        self.scripted_pages
            .lock()
            .entry(endpoint.into())
            .or_default()
            .push_back(page);
        self
    }

    /// Every retrieve request received so far
    pub fn retrieve_requests(&self) -> Vec<RetrieveRequest> {
        self.retrieve_log.lock().clone()
    }

    /// Retrieve requests received for one object type
    pub fn requests_for(&self, object_type: &str) -> Vec<RetrieveRequest> {
        self.retrieve_log
            .lock()
            .iter()
            .filter(|r| r.object_type == object_type)
            .cloned()
            .collect()
    }

    /// Every REST page request received so far
    pub fn page_requests(&self) -> Vec<(String, PageParams)> {
        self.page_log.lock().clone()
    }

    fn push(&self, object_type: String, response: Result<RetrieveResponse>) {
        self.scripted
            .lock()
            .entry(object_type)
            .or_default()
            .push_back(response);
    }

    fn serve_table(request: &RetrieveRequest, records: &[Value]) -> RetrieveResponse {
        let matching: Vec<&Value> = records
            .iter()
            .filter(|r| request.filter.as_ref().map_or(true, |f| matches(f, r)))
            .collect();

        let offset = request
            .continue_request
            .as_deref()
            .and_then(|token| token.strip_prefix(CONTINUATION_PREFIX))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let size = request.batch_size.map_or(matching.len(), |n| n as usize).max(1);
        let end = (offset + size).min(matching.len());

        let page: Vec<Value> = matching[offset.min(end)..end]
            .iter()
            .map(|r| project(r, &request.properties))
            .collect();

        if end < matching.len() {
            RetrieveResponse::more(format!("{CONTINUATION_PREFIX}{end}"), page)
        } else {
            RetrieveResponse::ok(page)
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResponse> {
        self.retrieve_log.lock().push(request.clone());

        let scripted = self
            .scripted
            .lock()
            .get_mut(&request.object_type)
            .and_then(VecDeque::pop_front);
        if let Some(response) = scripted {
            return response.and_then(|r| r.into_result(&request.object_type));
        }

        let tables = self.tables.lock();
        Ok(tables.get(&request.object_type).map_or_else(
            || RetrieveResponse::ok(Vec::new()),
            |records| Self::serve_table(request, records),
        ))
    }

    async fn get_page(&self, endpoint: &str, params: &PageParams) -> Result<RestPage> {
        self.page_log.lock().push((endpoint.to_string(), params.clone()));

        let scripted = self
            .scripted_pages
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        if let Some(page) = scripted {
            return page;
        }

        let collections = self.collections.lock();
        let items = collections.get(endpoint).map(Vec::as_slice).unwrap_or_default();
        let size = params.page_size.max(1) as usize;
        let start = (params.page.saturating_sub(1) as usize).saturating_mul(size);
        let page_items = items.iter().skip(start).take(size).cloned().collect();

        Ok(RestPage {
            items: page_items,
            page_info: PageInfo {
                page: params.page,
                page_size: params.page_size,
                count: Some(items.len() as u64),
            },
        })
    }
}

/// Keep only the requested properties; an empty list keeps everything.
/// `Email.ID` keeps `Email`, and property bags are always kept.
fn project(record: &Value, properties: &[String]) -> Value {
    let requested = |key: &str| {
        key == "Properties"
            || properties.iter().any(|p| {
                p == key || p.strip_prefix(key).is_some_and(|rest| rest.starts_with('.'))
            })
    };
    match record {
        Value::Object(map) if !properties.is_empty() => Value::Object(
            map.iter()
                .filter(|(k, _)| requested(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Top-level text field, or the matching entry of a property bag
fn field_text<'a>(record: &'a Value, property: &str) -> Option<&'a str> {
    if let Some(value) = record.get(property) {
        return value.as_str();
    }
    let bag = record.get("Properties")?.get("Property")?;
    let entries = match bag {
        Value::Array(entries) => entries.as_slice(),
        single => std::slice::from_ref(single),
    };
    entries
        .iter()
        .find(|e| e.get("Name").and_then(Value::as_str) == Some(property))
        .and_then(|e| e.get("Value"))
        .and_then(Value::as_str)
}

/// Evaluate the subset of filters the extractor sends
fn matches(filter: &SearchFilter, record: &Value) -> bool {
    match filter {
        SearchFilter::Complex {
            left,
            operator,
            right,
        } => match operator {
            LogicalOperator::And => matches(left, record) && matches(right, record),
            LogicalOperator::Or => matches(left, record) || matches(right, record),
        },
        SearchFilter::Simple {
            property,
            operator,
            values,
        } => {
            let actual = field_text(record, property);
            match (operator, values.as_slice()) {
                (SimpleOperator::Between, [FilterValue::Date(start), FilterValue::Date(end)]) => actual
                    .and_then(parse_datetime)
                    .is_some_and(|dt| *start <= dt && dt <= *end),
                (SimpleOperator::GreaterThan, [FilterValue::Date(bound)]) => {
                    actual.and_then(parse_datetime).is_some_and(|dt| dt > *bound)
                }
                (SimpleOperator::GreaterThanOrEqual, [FilterValue::Date(bound)]) => {
                    actual.and_then(parse_datetime).is_some_and(|dt| dt >= *bound)
                }
                (SimpleOperator::LessThan, [FilterValue::Date(bound)]) => {
                    actual.and_then(parse_datetime).is_some_and(|dt| dt < *bound)
                }
                (SimpleOperator::LessThanOrEqual, [FilterValue::Date(bound)]) => {
                    actual.and_then(parse_datetime).is_some_and(|dt| dt <= *bound)
                }
                (SimpleOperator::Equals, [FilterValue::Text(expected)]) => {
                    actual == Some(expected.as_str())
                }
                (SimpleOperator::IsNotNull, []) => actual.is_some(),
                (SimpleOperator::IsNull, []) => actual.is_none(),
                _ => true,
            }
        }
    }
}
