//! Scenario: sequential list session against a scripted source
//!
//! # Invariants under test
//!
//! 1. A full reload replaces the list and stores the server cursor; the next
//!    incremental refresh sends that cursor as `since` and merges by id.
//! 2. A failed incremental refresh returns the error and leaves items, cursor
//!    and total exactly as they were.
//! 3. An incremental refresh before any successful reload runs a full reload.
//! 4. Invalidating with a new filter drops every previously held record.
//! 5. Every response a session awaits is applied, including after a failed
//!    reload bumped the generation; none is reported as discarded.
//!
//! All tests are in-process; no network required.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use adm_feed::{FetchError, ListQuery, ListingSource};
use adm_reconcile::{ApplyOutcome, Cursor, Filter, Page, Record};
use adm_runtime::ListSession;

#[derive(Clone, Debug, PartialEq)]
struct Row {
    id: String,
    created_at: String,
    status: String,
}

impl Record for Row {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }
}

fn row(id: &str, created_at: &str, status: &str) -> Row {
    Row {
        id: id.to_string(),
        created_at: created_at.to_string(),
        status: status.to_string(),
    }
}

/// Pops one scripted response per call; an exhausted script answers with an
/// empty page.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Page<Row>, FetchError>>>,
    queries: Mutex<Vec<ListQuery>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Page<Row>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ListingSource<Row> for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Row>, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Page::empty()))
    }
}

fn ids(rows: &[Row]) -> Vec<&str> {
    rows.iter().map(|r| r.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// 1. Reload then incremental merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reload_then_incremental_merges_by_id() {
    let source = ScriptedSource::new(vec![
        Ok(Page::new(vec![
            row("A", "2024-06-01T10:00:00Z", "paid"),
            row("B", "2024-06-01T09:00:00Z", "paid"),
        ])
        .with_next_cursor("C1")
        .with_total(2)),
        Ok(Page::new(vec![
            row("C", "2024-06-01T11:00:00Z", "paid"),
            row("B", "2024-06-01T09:00:00Z", "shipped"),
        ])
        .with_next_cursor("C2")
        .with_total(3)),
    ]);
    let mut session = ListSession::<Row>::new(source.clone(), 50);

    let outcome = session.full_reload(Filter::all()).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Replaced { len: 2 });

    let outcome = session.incremental_refresh().await.unwrap();
    assert_eq!(
        outcome,
        ApplyOutcome::Merged {
            inserted: 1,
            updated: 1
        }
    );

    let view = session.view();
    assert_eq!(ids(&view.items), vec!["C", "A", "B"]);
    assert_eq!(view.items[2].status, "shipped");
    assert_eq!(view.cursor, Cursor::new("C2"));
    assert_eq!(view.total, Some(3));

    let queries = source.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].since.is_empty(), "full reload must not send since");
    assert_eq!(queries[1].since, Cursor::new("C1"));
    assert_eq!(queries[1].limit, 50);
}

// ---------------------------------------------------------------------------
// 2. Failure never partially updates state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_incremental_leaves_state_untouched() {
    let source = ScriptedSource::new(vec![
        Ok(Page::new(vec![row("A", "2024-06-01T10:00:00Z", "paid")])
            .with_next_cursor("C1")
            .with_total(1)),
        Err(FetchError::Transport("connection reset".to_string())),
    ]);
    let mut session = ListSession::<Row>::new(source, 50);
    session.full_reload(Filter::all()).await.unwrap();
    let before = session.view();

    let err = session.incremental_refresh().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(err.is_transient());

    assert_eq!(session.view(), before);
}

// ---------------------------------------------------------------------------
// 3. Incremental before any reload falls back to a full reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn incremental_without_prior_reload_runs_full_reload() {
    let source = ScriptedSource::new(vec![
        Err(FetchError::Api {
            status: Some(503),
            message: "maintenance".to_string(),
        }),
        Ok(Page::new(vec![row("A", "2024-06-01T10:00:00Z", "paid")]).with_next_cursor("C1")),
    ]);
    let mut session = ListSession::<Row>::new(source.clone(), 20);

    assert!(session.full_reload(Filter::status("paid")).await.is_err());
    assert!(session.reconciler().needs_full_reload());

    let outcome = session.incremental_refresh().await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Replaced { len: 1 });
    assert_eq!(session.view().filter, Filter::status("paid"));

    let queries = source.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].since.is_empty());
    assert_eq!(queries[1].filter, Filter::status("paid"));
}

// ---------------------------------------------------------------------------
// 4. Filter change drops old records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalidate_replaces_records_under_new_filter() {
    let source = ScriptedSource::new(vec![
        Ok(Page::new(vec![
            row("A", "2024-06-01T10:00:00Z", "paid"),
            row("B", "2024-06-01T09:00:00Z", "pending"),
        ])
        .with_next_cursor("C1")),
        Ok(Page::new(vec![row("B", "2024-06-01T09:00:00Z", "pending")])),
    ]);
    let mut session = ListSession::<Row>::new(source.clone(), 50);
    session.full_reload(Filter::all()).await.unwrap();

    session.invalidate(Filter::status("pending")).await.unwrap();

    let view = session.view();
    assert_eq!(ids(&view.items), vec!["B"]);
    assert_eq!(view.filter, Filter::status("pending"));
    // server omitted next_since on the reload
    assert!(view.cursor.is_empty());
    assert_eq!(source.queries()[1].filter, Filter::status("pending"));
}

#[tokio::test]
async fn every_awaited_response_applies_after_failed_reload() {
    let source = ScriptedSource::new(vec![
        Ok(Page::new(vec![row("A", "2024-06-01T10:00:00Z", "paid")])),
        Err(FetchError::Transport("reset".to_string())),
        Ok(Page::new(vec![row("B", "2024-06-01T09:00:00Z", "pending")]).with_next_cursor("C1")),
        Ok(Page::new(vec![row("C", "2024-06-01T11:00:00Z", "pending")])),
    ]);
    let mut session = ListSession::<Row>::new(source.clone(), 50);

    assert_eq!(
        session.full_reload(Filter::all()).await.unwrap(),
        ApplyOutcome::Replaced { len: 1 }
    );
    assert!(session.invalidate(Filter::status("paid")).await.is_err());
    assert_eq!(
        session.invalidate(Filter::status("pending")).await.unwrap(),
        ApplyOutcome::Replaced { len: 1 }
    );
    assert_eq!(
        session.incremental_refresh().await.unwrap(),
        ApplyOutcome::Merged {
            inserted: 1,
            updated: 0
        }
    );

    assert_eq!(ids(&session.view().items), vec!["C", "B"]);
    assert_eq!(session.reconciler().generation(), 3);
}
