use std::sync::Arc;

use adm_feed::{AdminOrder, FetchError, ListQuery, ListingSource};
use adm_reconcile::{ApplyOutcome, FetchTicket, Filter, ListView, Reconciler, Record};
use tracing::{debug, info, warn};

/// Sequential reconciler driver: one fetch at a time, awaited inline.
///
/// Every operation takes `&mut self`, so no response can be overtaken while
/// in flight and a stale ticket is a bug (debug builds panic; release builds
/// log and report [`ApplyOutcome::Unchanged`]). Use [`crate::spawn_poller`]
/// when fetches must overlap with operator input.
pub struct ListSession<R> {
    source: Arc<dyn ListingSource<R>>,
    reconciler: Reconciler<R>,
    page_limit: u32,
}

pub type OrdersSession = ListSession<AdminOrder>;

impl<R: Record + Send + Sync + 'static> ListSession<R> {
    pub fn new(source: Arc<dyn ListingSource<R>>, page_limit: u32) -> Self {
        Self {
            source,
            reconciler: Reconciler::new(),
            page_limit,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    pub fn view(&self) -> ListView<R> {
        self.reconciler.view()
    }

    /// Replace the whole list with the first page for `filter`.
    ///
    /// On error the previous list and cursor stay in place.
    pub async fn full_reload(&mut self, filter: Filter) -> Result<ApplyOutcome, FetchError> {
        let ticket = self.reconciler.begin_full_reload(filter);
        self.run(ticket).await
    }

    /// Merge records newer than the cursor.
    ///
    /// Falls back to a full reload when nothing has been loaded yet or the
    /// last reload failed.
    pub async fn incremental_refresh(&mut self) -> Result<ApplyOutcome, FetchError> {
        match self.reconciler.begin_incremental() {
            Some(ticket) => self.run(ticket).await,
            None => {
                let filter = self.reconciler.pending_filter().clone();
                debug!(%filter, "incremental refresh requested before a successful reload");
                self.full_reload(filter).await
            }
        }
    }

    /// Filter changed: reload from scratch under the new filter.
    pub async fn invalidate(&mut self, filter: Filter) -> Result<ApplyOutcome, FetchError> {
        info!(from = %self.reconciler.filter(), to = %filter, "list filter changed");
        self.full_reload(filter).await
    }

    async fn run(&mut self, ticket: FetchTicket) -> Result<ApplyOutcome, FetchError> {
        let query = ListQuery::from_ticket(&ticket, self.page_limit);
        let page = match self.source.fetch_page(&query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    source = self.source.source_name(),
                    kind = ticket.kind().as_str(),
                    error = %e,
                    "list fetch failed; keeping last good state"
                );
                return Err(e);
            }
        };

        match self.reconciler.apply(&ticket, page) {
            Ok(outcome) => {
                debug!(
                    source = self.source.source_name(),
                    kind = ticket.kind().as_str(),
                    ?outcome,
                    cursor = %self.reconciler.cursor(),
                    "list response applied"
                );
                Ok(outcome)
            }
            // `ticket` is the newest one issued: `&mut self` is held from
            // begin to apply, so no later ticket can exist.
            Err(stale) => {
                debug_assert!(false, "session ticket overtaken: {stale}");
                warn!(%stale, "list response discarded");
                Ok(ApplyOutcome::Unchanged)
            }
        }
    }
}
