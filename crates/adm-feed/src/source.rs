//! Listing-source boundary.
//!
//! Only the trait and the query type live here. Concrete HTTP wiring is in
//! `client.rs`; list state lives in `adm-reconcile`.

use adm_reconcile::{Cursor, FetchKind, FetchTicket, Filter, Page};

use crate::FetchError;

/// One listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Filter,
    /// Sent as `since` when non-empty.
    pub since: Cursor,
    pub limit: u32,
}

impl ListQuery {
    pub fn first_page(filter: Filter, limit: u32) -> Self {
        Self {
            filter,
            since: Cursor::empty(),
            limit,
        }
    }

    /// Translate a reconciler ticket. Full reloads never carry a cursor.
    pub fn from_ticket(ticket: &FetchTicket, limit: u32) -> Self {
        let since = match ticket.kind() {
            FetchKind::FullReload => Cursor::empty(),
            FetchKind::Incremental => ticket.since().clone(),
        };
        Self {
            filter: ticket.filter().clone(),
            since,
            limit,
        }
    }
}

/// Upstream listing endpoint contract.
///
/// Object-safe and `Send + Sync` so the poller can hold an
/// `Arc<dyn ListingSource<R>>` across spawned fetch tasks.
#[async_trait::async_trait]
pub trait ListingSource<R>: Send + Sync {
    /// Human-readable name (e.g. `"admin-orders"`), used in logs.
    fn source_name(&self) -> &'static str;

    /// Fetch one page. Records newer than `query.since` when a cursor is set,
    /// the first page for `query.filter` otherwise.
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<R>, FetchError>;
}
