use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::models::CatalogSummary;

#[derive(Default)]
struct RotationState {
    items: Vec<CatalogSummary>,
    index: usize,
    /// Bumped on every adopt so a timer for an older list can never move the new one
    epoch: u64,
}

impl RotationState {
    fn advance(&mut self) {
        if self.items.len() > 1 {
            self.index = (self.index + 1) % self.items.len();
        }
    }
}

/// Cycles which candidate of the active list is on display
pub struct RotationPresenter {
    interval: Duration,
    state: Arc<Mutex<RotationState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RotationPresenter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Arc::new(Mutex::new(RotationState::default())),
            timer: Mutex::new(None),
        }
    }

    /// Switches to a new candidate list, starting again from its first item
    ///
    /// The running timer is cancelled; a new one is started only when there is
    /// more than one item to rotate through. Must be called from within a tokio
    /// runtime when `items` has more than one entry.
    pub fn adopt(&self, items: Vec<CatalogSummary>) {
        self.cancel_timer();

        let len = items.len();
        let epoch = {
            let mut state = lock(&self.state);
            state.items = items;
            state.index = 0;
            state.epoch += 1;
            state.epoch
        };

        if len > 1 {
            let handle = self.spawn_timer(epoch);
            *lock(&self.timer) = Some(handle);
            tracing::debug!(items = len, interval_ms = self.interval.as_millis() as u64, "Rotation started");
        }
    }

    /// Moves to the next candidate; a list of one or none never moves
    pub fn advance(&self) {
        lock(&self.state).advance();
    }

    pub fn current(&self) -> Option<CatalogSummary> {
        let state = lock(&self.state);
        state.items.get(state.index).cloned()
    }

    pub fn index(&self) -> usize {
        lock(&self.state).index
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    pub fn is_rotating(&self) -> bool {
        lock(&self.timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops rotating. The current list stays readable.
    pub fn shutdown(&self) {
        self.cancel_timer();
        tracing::debug!("Rotation stopped");
    }

    fn cancel_timer(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }

    fn spawn_timer(&self, epoch: u64) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let mut guard = lock(&state);
                if guard.epoch != epoch {
                    break;
                }
                guard.advance();
            }
        })
    }
}

impl Drop for RotationPresenter {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// Locks `mutex`, recovering the guard if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
