//! The poll → fill → acknowledge loop.

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::accessor::FormAccessor;
use crate::config::{AckPolicy, FillerConfig};
use crate::engine::{FillReport, FormFillEngine};
use crate::queue::WorkQueue;
use crate::request::{FillRequest, RequestId};
use crate::state::{CycleGuard, FillPhase, ProcessingState};

/// Result of one fill cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub request_id: RequestId,
    /// Filled fields, if the fill/submit steps completed.
    pub report: Option<FillReport>,
    /// Error that cut the cycle short.
    pub error: Option<String>,
    /// Whether the server accepted the acknowledgment.
    pub acknowledged: bool,
}

/// What a single poll tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A cycle was already running, the server was not asked.
    Busy,
    /// An earlier poll is still waiting on the server, the server was not asked.
    InFlight,
    NoWork,
    /// The server could not be reached or answered nonsense.
    Failed,
    Processed(CycleReport),
}

/// Owns the shared state, the queue client and the fill engine.
pub struct AutoFiller<A, Q> {
    engine: FormFillEngine<A>,
    queue: Q,
    state: Arc<ProcessingState>,
}

impl<A, Q> AutoFiller<A, Q>
where
    A: FormAccessor + 'static,
    Q: WorkQueue + 'static,
{
    pub fn new(form: A, queue: Q, config: FillerConfig) -> Self {
        Self {
            engine: FormFillEngine::new(form, config),
            queue,
            state: ProcessingState::new(),
        }
    }

    pub fn state(&self) -> &Arc<ProcessingState> {
        &self.state
    }

    pub fn engine(&self) -> &FormFillEngine<A> {
        &self.engine
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Poll forever at the configured cadence.
    ///
    /// The timer keeps ticking while a poll or cycle runs; ticks that land
    /// on either are dropped rather than queued.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.engine.config().poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("polling for fill requests");

        loop {
            ticker.tick().await;
            if self.state.is_busy() || self.state.is_polling() {
                trace!("poll or cycle in progress, skipping tick");
                continue;
            }
            let filler = Arc::clone(&self);
            tokio::spawn(async move {
                filler.poll_once().await;
            });
        }
    }

    /// Ask the server for work once and, if there is some, process it.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.state.is_busy() {
            return PollOutcome::Busy;
        }
        // held until any cycle started from this poll has finished
        let Some(_poll) = self.state.try_poll() else {
            trace!("previous poll still in flight");
            return PollOutcome::InFlight;
        };

        let request = match self.queue.next_request().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("no pending requests");
                return PollOutcome::NoWork;
            }
            Err(e) => {
                warn!(error = %e, "checking for new requests failed");
                return PollOutcome::Failed;
            }
        };

        info!(request_id = %request.id, "new request found");
        match self.state.try_begin(request.clone()) {
            Some(cycle) => PollOutcome::Processed(self.process(cycle, request).await),
            None => {
                debug!(request_id = %request.id, "another cycle started first, dropping request");
                PollOutcome::Busy
            }
        }
    }

    /// Fill `request` straight away, without asking the server for it.
    ///
    /// Returns `None` if a cycle is already running. The request is still
    /// acknowledged according to the configured [`AckPolicy`].
    pub async fn fill_now(&self, request: FillRequest) -> Option<CycleReport> {
        let cycle = self.state.try_begin(request.clone())?;
        info!(request_id = %request.id, "filling request directly");
        Some(self.process(cycle, request).await)
    }

    /// Run one cycle. The state is released when `cycle` drops at the end of
    /// this function, whatever happened before.
    async fn process(&self, cycle: CycleGuard, request: FillRequest) -> CycleReport {
        let outcome = self.engine.run(&cycle, &request).await;

        let (report, error) = match outcome {
            Ok(report) => (Some(report), None),
            Err(e) => {
                error!(request_id = %request.id, error = %e, "filling form failed");
                (None, Some(e.to_string()))
            }
        };

        let should_ack = match self.engine.config().ack_policy {
            AckPolicy::CompletedOnly => error.is_none(),
            AckPolicy::Always => true,
        };

        let acknowledged = if should_ack {
            cycle.advance(FillPhase::Acknowledging);
            self.acknowledge(&request.id).await
        } else {
            false
        };

        drop(cycle);
        CycleReport {
            request_id: request.id,
            report,
            error,
            acknowledged,
        }
    }

    /// Mark `id` as processed on the server. Never retried.
    pub async fn acknowledge(&self, id: &RequestId) -> bool {
        let csrf_field = &self.engine.config().csrf_field;
        let token = match self.engine.form().hidden_value(csrf_field).await {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read anti-forgery token");
                String::new()
            }
        };

        match self.queue.mark_processed(id, &token).await {
            Ok(()) => {
                info!(request_id = %id, "request marked as processed");
                true
            }
            Err(e) => {
                error!(request_id = %id, error = %e, "failed to mark request as processed");
                false
            }
        }
    }
}
