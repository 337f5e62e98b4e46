//! Generation guard for in-flight fetches.
//!
//! # Purpose
//!
//! A timer-driven incremental refresh can still be on the wire when the
//! operator changes the filter or hits refresh. Its response describes the
//! old view and must not land on top of the new one. Every fetch is issued
//! with a [`FetchTicket`] carrying the generation that was current at issue
//! time; on completion the ticket is checked against the guard.
//!
//! # Invariants
//!
//! - **Monotonic**: the generation only ever increases.
//! - **Bumped by full reloads only**: incremental tickets share the current
//!   generation, so a stream of timer ticks never invalidates itself.
//! - **Stale → discarded**: a ticket whose generation differs from the
//!   current one is never applied.

use crate::{Cursor, Filter};

/// What a ticket asks the listing endpoint for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    /// First page for a filter; replaces the collection.
    FullReload,
    /// Records newer than the ticket's cursor; merged into the collection.
    Incremental,
}

impl FetchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchKind::FullReload => "full_reload",
            FetchKind::Incremental => "incremental",
        }
    }
}

/// A request issued by the reconciler. The caller turns it into an actual
/// fetch and hands the ticket back together with the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    kind: FetchKind,
    filter: Filter,
    since: Cursor,
}

impl FetchTicket {
    pub(crate) fn new(generation: u64, kind: FetchKind, filter: Filter, since: Cursor) -> Self {
        Self {
            generation,
            kind,
            filter,
            since,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Cursor to send as `since`. Always empty for full reloads.
    pub fn since(&self) -> &Cursor {
        &self.since
    }
}

// ---------------------------------------------------------------------------
// Freshness decision
// ---------------------------------------------------------------------------

/// Result of checking a [`FetchTicket`] against the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketFreshness {
    /// Issued under the current generation; may be applied.
    Current,
    /// Issued before the latest full reload.
    Stale { current: u64, got: u64 },
}

impl TicketFreshness {
    pub fn is_current(&self) -> bool {
        matches!(self, TicketFreshness::Current)
    }

    pub fn is_stale(&self) -> bool {
        !self.is_current()
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Monotonic generation counter.
#[derive(Clone, Debug, Default)]
pub struct GenerationGuard {
    current: u64,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self { current: 0 }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// Start a new generation. Everything issued before is now stale.
    pub fn bump(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn check(&self, ticket: &FetchTicket) -> TicketFreshness {
        if ticket.generation == self.current {
            TicketFreshness::Current
        } else {
            TicketFreshness::Stale {
                current: self.current,
                got: ticket.generation,
            }
        }
    }
}

/// Returned by [`crate::Reconciler::apply`] when the ticket has been superseded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleTicket {
    pub kind: FetchKind,
    pub freshness: TicketFreshness,
}

impl std::fmt::Display for StaleTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.freshness {
            TicketFreshness::Stale { current, got } => write!(
                f,
                "stale {} response discarded: issued at generation {got}, current is {current}",
                self.kind.as_str()
            ),
            TicketFreshness::Current => {
                write!(f, "StaleTicket: constructed with Current (logic error)")
            }
        }
    }
}

impl std::error::Error for StaleTicket {}
