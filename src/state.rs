//! Shared busy flag and current-request slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::request::FillRequest;

/// Where the current fill cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPhase {
    #[default]
    Idle,
    Filling,
    Submitting,
    Acknowledging,
}

#[derive(Debug, Default)]
struct Slot {
    phase: FillPhase,
    current: Option<FillRequest>,
}

/// State owned by the coordinator and shared with every poll task.
///
/// At most one [`CycleGuard`] exists at a time; while it lives the state is
/// busy and holds the request being processed. Likewise at most one
/// [`PollGuard`] exists, so only one request for work is ever in flight.
#[derive(Debug, Default)]
pub struct ProcessingState {
    busy: AtomicBool,
    polling: AtomicBool,
    slot: Mutex<Slot>,
}

impl ProcessingState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Whether a poll (request for work, plus any cycle it started) is running.
    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> FillPhase {
        self.slot().phase
    }

    /// Claim the right to ask the server for work.
    ///
    /// Returns `None` while another poll is still waiting on the server or
    /// running the cycle it started.
    pub fn try_poll(self: &Arc<Self>) -> Option<PollGuard> {
        self.polling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(PollGuard {
            state: Arc::clone(self),
        })
    }

    /// Request currently being processed, if any.
    pub fn current_request(&self) -> Option<FillRequest> {
        self.slot().current.clone()
    }

    /// Claim the state for `request`.
    ///
    /// Returns `None` without touching anything if a cycle is already running.
    pub fn try_begin(self: &Arc<Self>, request: FillRequest) -> Option<CycleGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let mut slot = self.slot();
        slot.current = Some(request);
        slot.phase = FillPhase::Filling;
        drop(slot);

        Some(CycleGuard {
            state: Arc::clone(self),
        })
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that a poll is in flight. Dropping it lets the next tick poll.
#[derive(Debug)]
pub struct PollGuard {
    state: Arc<ProcessingState>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.state.polling.store(false, Ordering::Release);
    }
}

/// Proof that a fill cycle owns the state. Dropping it ends the cycle.
#[derive(Debug)]
pub struct CycleGuard {
    state: Arc<ProcessingState>,
}

impl CycleGuard {
    pub fn advance(&self, phase: FillPhase) {
        self.state.slot().phase = phase;
    }

    pub fn phase(&self) -> FillPhase {
        self.state.phase()
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let mut slot = self.state.slot();
        slot.current = None;
        slot.phase = FillPhase::Idle;
        drop(slot);
        self.state.busy.store(false, Ordering::Release);
    }
}
