//! Cursor implementations
//!
//! `RetrieveCursor` follows continuation tokens; `PagedCursor` walks page
//! numbers. Both stop for good after the first error.

use super::types::{PaginationState, RecordCursor};
use crate::error::{Error, Result};
use crate::soap::RetrieveRequest;
use crate::transport::{PageParams, Transport};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// Retrieve cursor
// ============================================================================

/// Traversal of a SOAP retrieve result set
pub struct RetrieveCursor<'a> {
    transport: &'a dyn Transport,
    request: RetrieveRequest,
    state: PaginationState,
}

impl<'a> RetrieveCursor<'a> {
    /// Start a traversal; nothing is fetched until the first `next_page`
    pub fn new(transport: &'a dyn Transport, request: RetrieveRequest) -> Self {
        Self {
            transport,
            request,
            state: PaginationState::new(),
        }
    }

    /// The request this traversal repeats
    pub fn request(&self) -> &RetrieveRequest {
        &self.request
    }

    /// Flatten the traversal into a stream of records
    pub fn into_stream(self) -> BoxStream<'a, Result<Value>> {
        records_stream(self)
    }
}

#[async_trait]
impl RecordCursor for RetrieveCursor<'_> {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.state.is_done() {
            return Ok(None);
        }

        let request = self.request.continued(self.state.continuation.as_deref());
        self.state.begin_fetch();

        let response = match self.transport.retrieve(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.state.mark_done();
                return Err(e);
            }
        };

        let mut more = response.has_more();
        if more && response.request_id.is_none() {
            warn!(
                object_type = %self.request.object_type,
                "Server announced more data without a RequestID, stopping"
            );
            more = false;
        }
        self.state.continuation = response.request_id;
        self.state.finish_fetch(response.results.len(), more);

        debug!(
            object_type = %self.request.object_type,
            call = self.state.calls,
            records = response.results.len(),
            more,
            "Retrieved page"
        );
        Ok(Some(response.results))
    }

    fn state(&self) -> &PaginationState {
        &self.state
    }
}

// ============================================================================
// Page-number cursor
// ============================================================================

/// Traversal of a REST collection by page number.
///
/// A page shorter than the page size ends the traversal, as does reaching
/// the server-reported item count.
pub struct PagedCursor<'a> {
    transport: &'a dyn Transport,
    endpoint: String,
    params: PageParams,
    state: PaginationState,
}

impl<'a> PagedCursor<'a> {
    /// Start a traversal of `endpoint` with `page_size` items per page
    pub fn new(transport: &'a dyn Transport, endpoint: impl Into<String>, page_size: u32) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            params: PageParams::first(page_size.max(1)),
            state: PaginationState::new(),
        }
    }

    /// Add an extra query parameter to every page request
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.query.push((key.into(), value.into()));
        self
    }

    /// Flatten the traversal into a stream of records
    pub fn into_stream(self) -> BoxStream<'a, Result<Value>> {
        records_stream(self)
    }
}

#[async_trait]
impl RecordCursor for PagedCursor<'_> {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.state.is_done() {
            return Ok(None);
        }

        self.state.begin_fetch();
        let page = match self.transport.get_page(&self.endpoint, &self.params).await {
            Ok(page) => page,
            Err(e) => {
                self.state.mark_done();
                return Err(e);
            }
        };

        let received = page.items.len();
        let fetched_after = self.state.total_fetched + received as u64;
        let full_page = received > 0 && received >= self.params.page_size as usize;
        let below_count = page.page_info.count.map_or(true, |count| fetched_after < count);
        let more = full_page && below_count;

        self.state.finish_fetch(received, more);
        if more {
            self.params = self.params.next();
            self.state.page = self.params.page;
        }

        debug!(
            endpoint = %self.endpoint,
            page = page.page_info.page,
            records = received,
            more,
            "Fetched page"
        );
        Ok(Some(page.items))
    }

    fn state(&self) -> &PaginationState {
        &self.state
    }
}

/// Pages pulled one at a time, records yielded in server order
fn records_stream<'a, C>(cursor: C) -> BoxStream<'a, Result<Value>>
where
    C: RecordCursor + 'a,
{
    stream::try_unfold(cursor, |mut cursor| async move {
        Ok::<_, Error>(cursor.next_page().await?.map(|page| (page, cursor)))
    })
    .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Value, Error>)))
    .try_flatten()
    .boxed()
}

impl std::fmt::Debug for RetrieveCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieveCursor")
            .field("request", &self.request)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PagedCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedCursor")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
