//! adm-runtime
//!
//! Drives an [`adm_reconcile::Reconciler`] against a [`adm_feed::ListingSource`].
//!
//! - [`ListSession`]: sequential, caller-driven full reload / incremental refresh.
//! - [`spawn_poller`]: background task with a fixed-interval timer, operator
//!   commands, and generation-guarded in-flight fetches.

mod poller;
mod session;

pub use poller::{
    spawn_poller, PollCommand, PollEvent, PollerConfig, PollerHandle, DEFAULT_POLL_INTERVAL,
    MIN_POLL_INTERVAL,
};
pub use session::{ListSession, OrdersSession};
