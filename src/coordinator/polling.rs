//! Polling coordinator.
//! Periodically fetches data, masks transient failures behind the last known
//! data and reports the data as unavailable once failures persist.
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_lock::Mutex;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;

use super::error::{Classify, FailureKind, UpdateError};
use super::state::{CoordinatorState, Snapshot};

/// Zero-argument data fetch operation driven by the coordinator.
pub trait Fetch: Send + Sync + 'static {
    type Output: Send + Sync + 'static;
    type Error: std::error::Error + Classify + Send + Sync + 'static;

    fn fetch(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Coordinator settings, fixed for the coordinator's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time between two scheduled fetches.
    pub interval: Duration,
    /// Consecutive failed cycles before the data is reported unavailable.
    pub max_failures: u32,
    /// Attempts within a single cycle, 1 disables the inner retry.
    pub fetch_attempts: u32,
    /// Delay between two attempts of the same cycle.
    pub fetch_retry_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval: Duration::from_secs(60),
            max_failures: 3,
            fetch_attempts: 1,
            fetch_retry_delay: Duration::from_secs(2),
        }
    }
}

pub struct PollingCoordinator<F: Fetch> {
    name: String,
    fetcher: F,
    settings: Settings,
    state: watch::Sender<CoordinatorState<F::Output>>,
    in_flight: Mutex<()>,
    completed_cycles: AtomicU64,
    shutdown: CancellationToken,
}

impl<F: Fetch> PollingCoordinator<F> {
    /// Creates a new coordinator. It stops when `shutdown` (or [`Self::request_shutdown`]) fires.
    pub fn new(
        name: impl Into<String>,
        fetcher: F,
        settings: Settings,
        shutdown: &CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(CoordinatorState::new(settings.max_failures));
        PollingCoordinator {
            name: name.into(),
            fetcher,
            settings,
            state,
            in_flight: Mutex::new(()),
            completed_cycles: AtomicU64::new(0),
            shutdown: shutdown.child_token(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the last known data and its health. Never blocks on a fetch.
    pub fn get_snapshot(&self) -> Snapshot<F::Output> {
        self.state.borrow().snapshot()
    }

    /// Subscribe to state changes, one notification per completed cycle.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState<F::Output>> {
        self.state.subscribe()
    }

    /// Fetch initial data eagerly, before the scheduler starts.
    /// Fails if no data could be obtained.
    pub async fn first_refresh(&self) -> Result<(), UpdateError> {
        self.refresh_now().await?;
        if self.state.borrow().data().is_none() {
            return Err(UpdateError::Failed("no data available".to_string()));
        }
        Ok(())
    }

    /// Fetch immediately, outside of the schedule.
    /// A call made while a fetch is running waits for it and returns its outcome.
    pub async fn refresh_now(&self) -> Result<(), UpdateError> {
        if self.shutdown.is_cancelled() {
            return Err(UpdateError::Shutdown);
        }
        let seen = self.completed_cycles.load(Ordering::Acquire);
        let _guard = self.in_flight.lock().await;
        if self.completed_cycles.load(Ordering::Acquire) != seen {
            log::debug!("{}: joined in-flight refresh", self.name);
            return self.state.borrow().last_result().cloned().unwrap_or(Ok(()));
        }
        // The previous holder may have been dropped after shutdown was requested.
        if self.shutdown.is_cancelled() {
            return Err(UpdateError::Shutdown);
        }
        let result = self.cycle().await;
        self.completed_cycles.fetch_add(1, Ordering::Release);
        result
    }

    /// Run the schedule until shutdown.
    /// Returns the error that stopped polling if credentials were rejected.
    pub async fn run(&self) -> Result<(), UpdateError> {
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::debug!("{}: polling every {period:?}", self.name);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => match self.refresh_now().await {
                    Err(err) if err.is_auth_failed() => {
                        log::error!("{}: polling stopped, re-authentication required", self.name);
                        return Err(err);
                    }
                    Err(UpdateError::Shutdown) => break,
                    // Failures are logged by the cycle itself.
                    Ok(()) | Err(_) => {}
                },
            }
        }
        log::info!("{}: polling stopped", self.name);
        Ok(())
    }

    /// Cancel the pending scheduled fetch and refuse new ones.
    /// A fetch already running completes but its result is discarded.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn cycle(&self) -> Result<(), UpdateError> {
        let fetched = self.fetch_with_retry().await;
        if self.shutdown.is_cancelled() {
            log::debug!("{}: shutdown requested, discarding fetch result", self.name);
            return self.update(|state| state.record_discarded());
        }
        match fetched {
            Ok(data) => {
                let result = self.update(|state| state.record_success(data, Utc::now()));
                log::debug!("{}: data updated", self.name);
                result
            }
            Err(err) => {
                let kind = err.failure_kind();
                let result = self.update(|state| state.record_failure(kind, err.to_string()));
                self.log_failure(&err, &result);
                result
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<F::Output, F::Error> {
        let retries = self.settings.fetch_attempts.saturating_sub(1) as usize;
        let strategy = FixedInterval::new(self.settings.fetch_retry_delay).take(retries);
        RetryIf::spawn(
            strategy,
            || self.fetcher.fetch(),
            |err: &F::Error| {
                let retry = err.failure_kind() == FailureKind::Transient
                    && !self.shutdown.is_cancelled();
                if retry {
                    log::debug!("{}: fetch attempt failed, retrying: {err}", self.name);
                }
                retry
            },
        )
        .await
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut CoordinatorState<F::Output>) -> Result<(), UpdateError>,
    ) -> Result<(), UpdateError> {
        let mut result = Ok(());
        self.state.send_modify(|state| result = apply(state));
        result
    }

    fn log_failure(&self, err: &F::Error, result: &Result<(), UpdateError>) {
        let (failures, max) = {
            let state = self.state.borrow();
            (state.consecutive_failures(), state.max_failures())
        };
        match result {
            Ok(()) => log::warn!(
                "{}: fetch failed (attempt {failures}/{max}), keeping last known data: {err}",
                self.name
            ),
            Err(UpdateError::Failed(_)) => log::warn!(
                "{}: fetch failed (attempt {failures}/{max}), no data available yet: {err}",
                self.name
            ),
            Err(UpdateError::Exhausted { .. }) => log::error!(
                "{}: max consecutive failures reached, marking unavailable: {err}",
                self.name
            ),
            Err(UpdateError::AuthFailed(_)) => {
                log::error!("{}: authentication failed: {err}", self.name)
            }
            Err(UpdateError::Shutdown) => {}
        }
    }
}
