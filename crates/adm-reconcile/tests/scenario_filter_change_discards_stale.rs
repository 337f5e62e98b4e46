//! Scenario: Filter Change Discards Stale Responses
//!
//! # Invariants under test
//!
//! 1. A full reload after a filter change drops every previously held record,
//!    including ones that would also have matched the old filter.
//! 2. An incremental response issued before the reload is discarded when it
//!    arrives after the reload was started, whether before or after the
//!    reload's own response.
//! 3. Of two overlapping full reloads, only the latest one applies.
//! 4. A failed reload (never applied) leaves the previous state intact and
//!    keeps asking for a full reload.
//! 5. Incremental refreshes are refused while a reload is outstanding.

use adm_reconcile::{
    ApplyOutcome, Cursor, FetchKind, Filter, Page, Reconciler, Record, TicketFreshness,
};

#[derive(Clone, Debug, PartialEq)]
struct Order {
    id: String,
    created_at: String,
    status: String,
}

impl Record for Order {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }
}

fn order(id: &str, created_at: &str, status: &str) -> Order {
    Order {
        id: id.to_string(),
        created_at: created_at.to_string(),
        status: status.to_string(),
    }
}

fn loaded() -> Reconciler<Order> {
    let mut r = Reconciler::new();
    let t = r.begin_full_reload(Filter::all());
    r.apply(
        &t,
        Page::new(vec![
            order("A", "2024-06-01T10:00:00Z", "paid"),
            order("B", "2024-06-01T09:00:00Z", "pending"),
        ])
        .with_next_cursor("C1"),
    )
    .unwrap();
    r
}

// ---------------------------------------------------------------------------
// 1. Reload replaces everything
// ---------------------------------------------------------------------------

#[test]
fn reload_after_filter_change_drops_old_records() {
    let mut r = loaded();

    let t = r.begin_full_reload(Filter::status("paid"));
    assert_eq!(t.kind(), FetchKind::FullReload);
    assert!(t.since().is_empty(), "full reload never sends a cursor");

    let outcome = r
        .apply(&t, Page::new(vec![order("P", "2024-06-01T08:00:00Z", "paid")]))
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Replaced { len: 1 });
    assert!(
        !r.collection().contains("A"),
        "A matched both filters but must still be dropped"
    );
    assert!(!r.collection().contains("B"));
    assert_eq!(r.filter(), &Filter::status("paid"));
    assert_eq!(r.cursor(), &Cursor::empty());
}

// ---------------------------------------------------------------------------
// 2. In-flight incremental response is discarded
// ---------------------------------------------------------------------------

#[test]
fn incremental_arriving_before_reload_response_is_discarded() {
    let mut r = loaded();
    let inc = r.begin_incremental().expect("loaded");
    let reload = r.begin_full_reload(Filter::status("paid"));

    let err = r
        .apply(&inc, Page::new(vec![order("X", "2024-06-01T11:00:00Z", "pending")]))
        .unwrap_err();
    assert_eq!(err.kind, FetchKind::Incremental);
    assert_eq!(err.freshness, TicketFreshness::Stale { current: 2, got: 1 });
    assert!(!r.collection().contains("X"));

    r.apply(&reload, Page::new(vec![order("P", "2024-06-01T08:00:00Z", "paid")]))
        .unwrap();
    assert_eq!(r.collection().len(), 1);
}

#[test]
fn incremental_arriving_after_reload_response_is_discarded() {
    let mut r = loaded();
    let inc = r.begin_incremental().expect("loaded");
    let reload = r.begin_full_reload(Filter::status("paid"));

    let reloaded =
        Page::new(vec![order("P", "2024-06-01T08:00:00Z", "paid")]).with_next_cursor("P1");
    r.apply(&reload, reloaded).unwrap();
    let view = r.view();

    let late =
        Page::new(vec![order("X", "2024-06-01T11:00:00Z", "pending")]).with_next_cursor("X9");
    assert!(r.apply(&inc, late).is_err());
    assert_eq!(r.view(), view, "stale response must not touch state");
    assert_eq!(r.cursor(), &Cursor::new("P1"));
}

// ---------------------------------------------------------------------------
// 3. Last full reload wins
// ---------------------------------------------------------------------------

#[test]
fn only_latest_full_reload_applies() {
    let mut r = loaded();
    let first = r.begin_full_reload(Filter::status("pending"));
    let second = r.begin_full_reload(Filter::status("paid"));

    r.apply(&second, Page::new(vec![order("P", "2024-06-01T08:00:00Z", "paid")]))
        .unwrap();
    assert!(r
        .apply(&first, Page::new(vec![order("Q", "2024-06-01T08:30:00Z", "pending")]))
        .is_err());

    assert_eq!(r.filter(), &Filter::status("paid"));
    assert!(r.collection().contains("P"));
    assert!(!r.collection().contains("Q"));
}

// ---------------------------------------------------------------------------
// 4/5. Failed reload leaves state, incremental refused meanwhile
// ---------------------------------------------------------------------------

#[test]
fn failed_reload_keeps_previous_state_and_blocks_incremental() {
    let mut r = loaded();
    let before = r.collection().clone();

    let _lost = r.begin_full_reload(Filter::status("paid"));
    // The fetch failed: nothing is applied.

    assert_eq!(r.collection(), &before);
    assert_eq!(r.cursor(), &Cursor::new("C1"));
    assert!(r.needs_full_reload());
    assert_eq!(r.pending_filter(), &Filter::status("paid"));
    assert!(r.begin_incremental().is_none());

    let retry = r.begin_full_reload(r.pending_filter().clone());
    r.apply(&retry, Page::empty()).unwrap();
    assert!(!r.needs_full_reload());
    assert!(r.collection().is_empty());
    assert!(r.begin_incremental().is_some());
}

#[test]
fn fresh_reconciler_requires_full_reload_first() {
    let r: Reconciler<Order> = Reconciler::new();
    assert!(r.needs_full_reload());
    assert!(r.begin_incremental().is_none());
    assert_eq!(r.generation(), 0);
}
