//! Background poller.
//!
//! One task owns the reconciler. Fetches run in their own spawned tasks and
//! report back `(ticket, result)`; the owner applies them through the
//! generation guard, so a response that was overtaken by a filter change or a
//! manual refresh is dropped on arrival instead of being cancelled.
//!
//! Timer ticks only issue an incremental refresh when auto refresh is on and
//! nothing is in flight. Filter changes and manual refreshes always issue a
//! new full reload immediately.

use std::sync::Arc;
use std::time::Duration;

use adm_feed::{FetchError, ListQuery, ListingSource};
use adm_reconcile::{
    ApplyOutcome, FetchKind, FetchTicket, Filter, ListView, Page, Reconciler, Record,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default incremental refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Floor for `PollerConfig::interval`; a zero period would panic the ticker.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub page_limit: u32,
    pub auto_refresh: bool,
    pub initial_filter: Filter,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            page_limit: 50,
            auto_refresh: true,
            initial_filter: Filter::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollCommand {
    /// Filter changed: full reload under the new filter.
    SetFilter(Filter),
    /// Manual refresh: full reload under the current filter.
    Refresh,
    SetAutoRefresh(bool),
    Shutdown,
}

/// Broadcast for observers (status line, logs, tests).
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Applied {
        kind: FetchKind,
        generation: u64,
        outcome: ApplyOutcome,
    },
    /// State untouched; the next tick (or a manual refresh) retries.
    FetchFailed {
        kind: FetchKind,
        generation: u64,
        error: FetchError,
    },
    /// Response arrived for a superseded generation and was dropped.
    Discarded {
        kind: FetchKind,
        got: u64,
        current: u64,
    },
}

pub struct PollerHandle<R> {
    commands: mpsc::Sender<PollCommand>,
    views: watch::Receiver<ListView<R>>,
    events_tx: broadcast::Sender<PollEvent>,
    /// Subscribed before the task started, so no event is missed.
    pub events: broadcast::Receiver<PollEvent>,
    join: JoinHandle<()>,
}

impl<R: Clone> PollerHandle<R> {
    pub async fn set_filter(&self, filter: Filter) -> bool {
        self.commands.send(PollCommand::SetFilter(filter)).await.is_ok()
    }

    pub async fn refresh(&self) -> bool {
        self.commands.send(PollCommand::Refresh).await.is_ok()
    }

    pub async fn set_auto_refresh(&self, on: bool) -> bool {
        self.commands
            .send(PollCommand::SetAutoRefresh(on))
            .await
            .is_ok()
    }

    /// Latest published view.
    pub fn current(&self) -> ListView<R> {
        self.views.borrow().clone()
    }

    pub fn views(&self) -> watch::Receiver<ListView<R>> {
        self.views.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PollEvent> {
        self.events_tx.subscribe()
    }

    /// Stop the task and wait for it. In-flight fetches are left to finish
    /// on their own; their results go nowhere.
    pub async fn shutdown(self) {
        let _ = self.commands.send(PollCommand::Shutdown).await;
        let _ = self.join.await;
    }
}

type Completion<R> = (FetchTicket, Result<Page<R>, FetchError>);

/// Spawn the poller. An initial full reload for `config.initial_filter` is
/// issued immediately.
pub fn spawn_poller<R>(source: Arc<dyn ListingSource<R>>, config: PollerConfig) -> PollerHandle<R>
where
    R: Record + Send + Sync + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let reconciler: Reconciler<R> = Reconciler::new();
    let (view_tx, view_rx) = watch::channel(reconciler.view());
    let (events_tx, events) = broadcast::channel(256);

    let worker = Worker {
        source,
        reconciler,
        page_limit: config.page_limit,
        auto_refresh: config.auto_refresh,
        in_flight: None,
        views: view_tx,
        events: events_tx.clone(),
    };
    let interval = if config.interval < MIN_POLL_INTERVAL {
        warn!(
            requested_ms = config.interval.as_millis() as u64,
            min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
            "poll interval below minimum, clamped"
        );
        MIN_POLL_INTERVAL
    } else {
        config.interval
    };
    let join = tokio::spawn(worker.run(cmd_rx, interval, config.initial_filter));

    PollerHandle {
        commands: cmd_tx,
        views: view_rx,
        events_tx,
        events,
        join,
    }
}

struct Worker<R> {
    source: Arc<dyn ListingSource<R>>,
    reconciler: Reconciler<R>,
    page_limit: u32,
    auto_refresh: bool,
    /// Most recently issued ticket whose response is still outstanding.
    in_flight: Option<FetchTicket>,
    views: watch::Sender<ListView<R>>,
    events: broadcast::Sender<PollEvent>,
}

impl<R> Worker<R>
where
    R: Record + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<PollCommand>,
        interval: Duration,
        initial_filter: Filter,
    ) {
        let (done_tx, mut done_rx) = mpsc::channel::<Completion<R>>(16);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;

        info!(
            source = self.source.source_name(),
            filter = %initial_filter,
            interval_ms = interval.as_millis() as u64,
            "list poller started"
        );
        let ticket = self.reconciler.begin_full_reload(initial_filter);
        self.issue(ticket, &done_tx);

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(PollCommand::Shutdown) => break,
                    Some(PollCommand::SetFilter(filter)) => {
                        info!(from = %self.reconciler.filter(), to = %filter, "list filter changed");
                        let ticket = self.reconciler.begin_full_reload(filter);
                        self.issue(ticket, &done_tx);
                    }
                    Some(PollCommand::Refresh) => {
                        let filter = self.reconciler.pending_filter().clone();
                        let ticket = self.reconciler.begin_full_reload(filter);
                        self.issue(ticket, &done_tx);
                    }
                    Some(PollCommand::SetAutoRefresh(on)) => {
                        debug!(on, "auto refresh toggled");
                        self.auto_refresh = on;
                    }
                },
                Some((ticket, result)) = done_rx.recv() => self.complete(ticket, result),
                _ = ticker.tick(), if self.auto_refresh => self.on_tick(&done_tx),
            }
        }

        info!(source = self.source.source_name(), "list poller stopped");
    }

    fn on_tick(&mut self, done_tx: &mpsc::Sender<Completion<R>>) {
        if self.in_flight.is_some() {
            debug!("poll tick skipped: fetch in flight");
            return;
        }
        let ticket = match self.reconciler.begin_incremental() {
            Some(t) => t,
            // last full reload failed (or never ran): retry it
            None => {
                let filter = self.reconciler.pending_filter().clone();
                self.reconciler.begin_full_reload(filter)
            }
        };
        self.issue(ticket, done_tx);
    }

    fn issue(&mut self, ticket: FetchTicket, done_tx: &mpsc::Sender<Completion<R>>) {
        let query = ListQuery::from_ticket(&ticket, self.page_limit);
        let source = Arc::clone(&self.source);
        let tx = done_tx.clone();
        self.in_flight = Some(ticket.clone());

        debug!(
            kind = ticket.kind().as_str(),
            generation = ticket.generation(),
            since = %query.since,
            "list fetch issued"
        );
        tokio::spawn(async move {
            let result = source.fetch_page(&query).await;
            let _ = tx.send((ticket, result)).await;
        });
    }

    fn complete(&mut self, ticket: FetchTicket, result: Result<Page<R>, FetchError>) {
        if self.in_flight.as_ref() == Some(&ticket) {
            self.in_flight = None;
        }

        if !self.reconciler.is_current(&ticket) {
            debug!(
                kind = ticket.kind().as_str(),
                got = ticket.generation(),
                current = self.reconciler.generation(),
                "stale list response discarded"
            );
            self.emit(PollEvent::Discarded {
                kind: ticket.kind(),
                got: ticket.generation(),
                current: self.reconciler.generation(),
            });
            return;
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                warn!(
                    source = self.source.source_name(),
                    kind = ticket.kind().as_str(),
                    error = %error,
                    "list fetch failed; keeping last good state"
                );
                self.emit(PollEvent::FetchFailed {
                    kind: ticket.kind(),
                    generation: ticket.generation(),
                    error,
                });
                return;
            }
        };

        match self.reconciler.apply(&ticket, page) {
            Ok(outcome) => {
                if outcome != ApplyOutcome::Unchanged {
                    self.views.send_replace(self.reconciler.view());
                }
                debug!(?outcome, cursor = %self.reconciler.cursor(), "list response applied");
                self.emit(PollEvent::Applied {
                    kind: ticket.kind(),
                    generation: ticket.generation(),
                    outcome,
                });
            }
            Err(stale) => warn!(%stale, "list response discarded"),
        }
    }

    fn emit(&self, event: PollEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
