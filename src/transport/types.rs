//! Transport types
//!
//! The `Transport` trait and the request/response shapes of the REST paged
//! protocol.

use crate::error::Result;
use crate::soap::{RetrieveRequest, RetrieveResponse};
use async_trait::async_trait;
use serde_json::Value;

/// One remote call per method; every implementation retries transient
/// faults internally and classifies logical errors before returning.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one page of a retrieve traversal
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResponse>;

    /// Fetch one page of a REST collection
    async fn get_page(&self, endpoint: &str, params: &PageParams) -> Result<RestPage>;
}

/// Parameters for a page-number REST request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    pub page_size: u32,
    /// Extra query parameters
    pub query: Vec<(String, String)>,
}

impl PageParams {
    /// First page with the given size
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            query: Vec::new(),
        }
    }

    /// The following page with the same size and query
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Query pairs as sent on the wire
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("$page".to_string(), self.page.to_string()),
            ("$pageSize".to_string(), self.page_size.to_string()),
        ];
        pairs.extend(self.query.iter().cloned());
        pairs
    }
}

/// Paging metadata echoed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Page number of this response
    pub page: u32,
    /// Page size of this response
    pub page_size: u32,
    /// Total number of items in the collection, when reported
    pub count: Option<u64>,
}

/// One page of a REST collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestPage {
    /// Records on this page
    pub items: Vec<Value>,
    /// Paging metadata
    pub page_info: PageInfo,
}

impl RestPage {
    /// Build a page from a REST collection body.
    ///
    /// Missing paging fields fall back to the request parameters.
    pub fn from_body(body: Value, params: &PageParams) -> Self {
        let read_u32 = |name: &str, default: u32| {
            body.get(name)
                .and_then(Value::as_u64)
                .map_or(default, |v| v as u32)
        };
        let page_info = PageInfo {
            page: read_u32("page", params.page),
            page_size: read_u32("pageSize", params.page_size),
            count: body.get("count").and_then(Value::as_u64),
        };

        let items = match body {
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Value::Array(items) => items,
            _ => Vec::new(),
        };

        Self { items, page_info }
    }
}
