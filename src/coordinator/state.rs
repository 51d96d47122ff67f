//! Coordinator state: last known data and the consecutive failure policy.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;

use super::error::{FailureKind, UpdateError};

/// Availability of the coordinator data for dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    #[strum(serialize = "available")]
    Available,
    #[strum(serialize = "unavailable")]
    Unavailable,
}

/// Read-only view handed to dependents.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub data: Option<Arc<T>>,
    pub health: Health,
    pub consecutive_failures: u32,
    pub reauth_required: bool,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Snapshot {
            data: self.data.clone(),
            health: self.health,
            consecutive_failures: self.consecutive_failures,
            reauth_required: self.reauth_required,
            last_success_at: self.last_success_at,
        }
    }
}

impl<T> Snapshot<T> {
    /// Returns `true` if dependents may present the data as current.
    pub fn is_usable(&self) -> bool {
        self.data.is_some() && self.health == Health::Available && !self.reauth_required
    }
}

/// State owned by a coordinator.
/// Only the fetch cycle mutates it, dependents read it through [`Snapshot`].
#[derive(Debug)]
pub struct CoordinatorState<T> {
    data: Option<Arc<T>>,
    max_failures: u32,
    consecutive_failures: u32,
    reauth_required: bool,
    last_success_at: Option<DateTime<Utc>>,
    last_result: Option<Result<(), UpdateError>>,
}

impl<T> CoordinatorState<T> {
    /// Creates an empty state. `max_failures` is clamped to at least 1.
    pub fn new(max_failures: u32) -> Self {
        CoordinatorState {
            data: None,
            max_failures: max_failures.max(1),
            consecutive_failures: 0,
            reauth_required: false,
            last_success_at: None,
            last_result: None,
        }
    }

    pub fn data(&self) -> Option<&Arc<T>> {
        self.data.as_ref()
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reauth_required(&self) -> bool {
        self.reauth_required
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    /// Outcome of the most recent fetch cycle, `None` before the first one.
    pub fn last_result(&self) -> Option<&Result<(), UpdateError>> {
        self.last_result.as_ref()
    }

    pub fn health(&self) -> Health {
        if self.consecutive_failures >= self.max_failures {
            Health::Unavailable
        } else {
            Health::Available
        }
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            data: self.data.clone(),
            health: self.health(),
            consecutive_failures: self.consecutive_failures,
            reauth_required: self.reauth_required,
            last_success_at: self.last_success_at,
        }
    }

    /// Replace the data wholesale and reset the failure counter.
    pub(crate) fn record_success(&mut self, data: T, at: DateTime<Utc>) -> Result<(), UpdateError> {
        self.data = Some(Arc::new(data));
        self.consecutive_failures = 0;
        self.reauth_required = false;
        self.last_success_at = Some(at);
        self.finish(Ok(()))
    }

    /// Apply a failed fetch. Returns `Ok` when the failure is masked by prior data.
    pub(crate) fn record_failure(
        &mut self,
        kind: FailureKind,
        message: String,
    ) -> Result<(), UpdateError> {
        let result = match kind {
            FailureKind::Auth => {
                self.reauth_required = true;
                Err(UpdateError::AuthFailed(message))
            }
            FailureKind::Transient => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.max_failures {
                    Err(UpdateError::Exhausted {
                        failures: self.consecutive_failures,
                        message,
                    })
                } else if self.data.is_some() {
                    Ok(())
                } else {
                    Err(UpdateError::Failed(message))
                }
            }
        };
        self.finish(result)
    }

    /// Record a cycle whose result was thrown away because of shutdown.
    pub(crate) fn record_discarded(&mut self) -> Result<(), UpdateError> {
        self.finish(Err(UpdateError::Shutdown))
    }

    fn finish(&mut self, result: Result<(), UpdateError>) -> Result<(), UpdateError> {
        self.last_result = Some(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Outcome {
        Success(u32),
        Transient,
        Auth,
    }

    fn apply(state: &mut CoordinatorState<u32>, outcome: Outcome) -> Result<(), UpdateError> {
        match outcome {
            Outcome::Success(value) => state.record_success(value, Utc::now()),
            Outcome::Transient => state.record_failure(FailureKind::Transient, "timeout".into()),
            Outcome::Auth => state.record_failure(FailureKind::Auth, "bad token".into()),
        }
    }

    fn run(outcomes: &[Outcome]) -> (CoordinatorState<u32>, Vec<Result<(), UpdateError>>) {
        let mut state = CoordinatorState::new(3);
        let results = outcomes.iter().map(|o| apply(&mut state, *o)).collect();
        (state, results)
    }

    #[test]
    fn test_new_state_is_empty_and_available() {
        let state = CoordinatorState::<u32>::new(3);
        assert!(state.data().is_none());
        assert_eq!(state.health(), Health::Available);
        assert_eq!(state.consecutive_failures(), 0);
        assert!(state.last_result().is_none());
        assert!(!state.snapshot().is_usable());
    }

    #[test]
    fn test_max_failures_is_clamped() {
        let state = CoordinatorState::<u32>::new(0);
        assert_eq!(state.max_failures(), 1);
    }

    #[test]
    fn test_two_transient_failures_keep_prior_data() {
        use Outcome::*;
        let (state, results) = run(&[Success(1), Transient, Transient]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.data.as_deref(), Some(&1));
        assert_eq!(snapshot.health, Health::Available);
        assert!(snapshot.is_usable());
        assert_eq!(state.consecutive_failures(), 2);
        assert!(results.iter().all(Result::is_ok), "failures must be masked");
    }

    #[test]
    fn test_third_transient_failure_marks_unavailable() {
        use Outcome::*;
        let (state, results) = run(&[Success(1), Transient, Transient, Transient]);

        assert_eq!(state.health(), Health::Unavailable);
        assert_eq!(state.data().map(|d| **d), Some(1), "data is retained");
        assert!(!state.snapshot().is_usable());
        assert_eq!(
            results.last(),
            Some(&Err(UpdateError::Exhausted {
                failures: 3,
                message: "timeout".into()
            }))
        );
    }

    #[test]
    fn test_transient_failure_without_data_is_reported() {
        let (state, results) = run(&[Outcome::Transient]);

        assert_eq!(results, vec![Err(UpdateError::Failed("timeout".into()))]);
        assert_eq!(state.health(), Health::Available);
        assert_eq!(state.consecutive_failures(), 1);
        assert!(state.data().is_none());
    }

    #[test]
    fn test_auth_failure_is_fatal_and_not_counted() {
        use Outcome::*;
        let (state, results) = run(&[Success(1), Auth]);

        assert_eq!(
            results.last(),
            Some(&Err(UpdateError::AuthFailed("bad token".into())))
        );
        assert_eq!(state.consecutive_failures(), 0);
        assert!(state.reauth_required());
        assert!(!state.snapshot().is_usable());
    }

    #[test]
    fn test_auth_failure_after_transient_failures_keeps_counter() {
        use Outcome::*;
        let (state, results) = run(&[Success(1), Transient, Transient, Auth]);

        assert!(results.last().unwrap().as_ref().unwrap_err().is_auth_failed());
        assert_eq!(state.consecutive_failures(), 2);
    }

    #[test]
    fn test_success_resets_counter_and_replaces_data() {
        use Outcome::*;
        let (state, _) = run(&[Success(1), Transient, Transient, Success(2)]);

        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.data().map(|d| **d), Some(2));
        assert_eq!(state.health(), Health::Available);
        assert_eq!(state.last_result(), Some(&Ok(())));
    }

    #[test]
    fn test_success_clears_reauth() {
        use Outcome::*;
        let (state, _) = run(&[Auth, Success(5)]);
        assert!(!state.reauth_required());
        assert!(state.snapshot().is_usable());
    }

    #[test]
    fn test_success_after_unavailable_restores_availability() {
        use Outcome::*;
        let (state, _) = run(&[Transient, Transient, Transient, Transient, Success(7)]);
        assert_eq!(state.health(), Health::Available);
        assert_eq!(state.data().map(|d| **d), Some(7));
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&[Outcome::Transient], 1)]
    #[case(&[Outcome::Success(1), Outcome::Transient, Outcome::Transient], 2)]
    #[case(&[Outcome::Transient, Outcome::Success(1)], 0)]
    #[case(&[Outcome::Transient, Outcome::Success(1), Outcome::Transient], 1)]
    #[case(&[Outcome::Transient, Outcome::Auth, Outcome::Transient], 2)]
    #[case(&[Outcome::Transient; 5], 5)]
    fn test_counter_equals_trailing_transient_failures(
        #[case] outcomes: &[Outcome],
        #[case] expected: u32,
    ) {
        let (state, _) = run(outcomes);
        assert_eq!(state.consecutive_failures(), expected);
    }

    #[test]
    fn test_discarded_cycle_reports_shutdown() {
        let mut state = CoordinatorState::<u32>::new(3);
        state.record_success(1, Utc::now()).unwrap();

        let result = state.record_discarded();

        assert_eq!(result, Err(UpdateError::Shutdown));
        assert_eq!(state.data().map(|d| **d), Some(1));
        assert_eq!(state.consecutive_failures(), 0);
    }
}
