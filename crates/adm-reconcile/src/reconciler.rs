use crate::engine::{merge_into, replace_with_page};
use crate::generation::{FetchKind, FetchTicket, GenerationGuard, StaleTicket};
use crate::{Collection, Cursor, Filter, Page, Record};

/// What an applied response did to the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Full reload: the collection now holds exactly `len` records.
    Replaced { len: usize },
    /// Incremental page merged.
    Merged { inserted: usize, updated: usize },
    /// Incremental page was empty.
    Unchanged,
}

/// Snapshot handed to the rendering layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView<R> {
    /// Newest first.
    pub items: Vec<R>,
    pub cursor: Cursor,
    pub total: Option<u64>,
    pub filter: Filter,
    pub generation: u64,
}

/// Owns one collection + cursor and the generation guard protecting them.
///
/// Sans-IO: the reconciler issues [`FetchTicket`]s and accepts pages back.
/// Failed fetches are simply never applied, so a failure cannot touch state.
#[derive(Clone, Debug)]
pub struct Reconciler<R> {
    collection: Collection<R>,
    cursor: Cursor,
    total: Option<u64>,
    /// Filter the current collection was loaded with.
    filter: Filter,
    /// Filter of the latest full reload not yet applied.
    requested: Option<Filter>,
    loaded: bool,
    guard: GenerationGuard,
}

impl<R: Record> Default for Reconciler<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Reconciler<R> {
    pub fn new() -> Self {
        Self {
            collection: Collection::new(),
            cursor: Cursor::empty(),
            total: None,
            filter: Filter::all(),
            requested: None,
            loaded: false,
            guard: GenerationGuard::new(),
        }
    }

    pub fn collection(&self) -> &Collection<R> {
        &self.collection
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.guard.current()
    }

    /// `true` until a full reload for the latest requested filter has landed.
    pub fn needs_full_reload(&self) -> bool {
        !self.loaded || self.requested.is_some()
    }

    /// The filter the next full reload should use.
    pub fn pending_filter(&self) -> &Filter {
        self.requested.as_ref().unwrap_or(&self.filter)
    }

    /// Start a full reload. Bumps the generation, so any response still in
    /// flight from earlier tickets will be discarded on arrival.
    pub fn begin_full_reload(&mut self, filter: Filter) -> FetchTicket {
        let generation = self.guard.bump();
        self.requested = Some(filter.clone());
        FetchTicket::new(generation, FetchKind::FullReload, filter, Cursor::empty())
    }

    /// Start an incremental refresh from the current cursor.
    ///
    /// Returns `None` while a full reload is outstanding (or none has landed
    /// yet): an incremental page fetched under the old filter could otherwise
    /// be merged into the freshly reloaded collection.
    pub fn begin_incremental(&self) -> Option<FetchTicket> {
        if self.needs_full_reload() {
            return None;
        }
        Some(FetchTicket::new(
            self.guard.current(),
            FetchKind::Incremental,
            self.filter.clone(),
            self.cursor.clone(),
        ))
    }

    /// `false` if a full reload was started after `ticket` was issued.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.guard.check(ticket).is_current()
    }

    /// Apply a successful response for `ticket`.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        page: Page<R>,
    ) -> Result<ApplyOutcome, StaleTicket> {
        let freshness = self.guard.check(ticket);
        if freshness.is_stale() {
            return Err(StaleTicket {
                kind: ticket.kind(),
                freshness,
            });
        }

        match ticket.kind() {
            FetchKind::FullReload => {
                let total = page.total;
                let (collection, cursor) = replace_with_page(page);
                self.collection = collection;
                self.cursor = cursor;
                self.total = total;
                self.filter = ticket.filter().clone();
                self.requested = None;
                self.loaded = true;
                Ok(ApplyOutcome::Replaced {
                    len: self.collection.len(),
                })
            }
            FetchKind::Incremental => {
                let total = page.total;
                let stats = merge_into(&mut self.collection, &mut self.cursor, page);
                if stats.is_noop() {
                    return Ok(ApplyOutcome::Unchanged);
                }
                if total.is_some() {
                    self.total = total;
                }
                Ok(ApplyOutcome::Merged {
                    inserted: stats.inserted,
                    updated: stats.updated,
                })
            }
        }
    }

    pub fn view(&self) -> ListView<R> {
        ListView {
            items: self.collection.as_slice().to_vec(),
            cursor: self.cursor.clone(),
            total: self.total,
            filter: self.filter.clone(),
            generation: self.guard.current(),
        }
    }
}
