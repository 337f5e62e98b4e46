//! adm-reconcile
//!
//! Incremental list reconciliation for cursor-based admin listings.
//!
//! Architectural decisions:
//! - One record per id; the projected sequence is always `created_at` descending
//! - Full reload replaces everything; incremental refresh only upserts
//! - Cursor moves forward on incremental merges and resets on full reload
//! - Every fetch carries a generation; responses from a superseded generation are discarded
//!
//! Deterministic, pure logic. No IO. No HTTP calls.

mod engine;
mod generation;
mod reconciler;
mod types;

pub use engine::{merge_incremental, merge_into, replace_with_page, MergeStats};
pub use generation::{FetchKind, FetchTicket, GenerationGuard, StaleTicket, TicketFreshness};
pub use reconciler::{ApplyOutcome, ListView, Reconciler};
pub use types::*;
