//! Bounded retry around one codec load. The state is an explicit value
//! handed in and out of every attempt, so the whole machine can be driven
//! and inspected from tests without touching the network.

use std::future::Future;
use std::time::Duration;

use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; 2 means 3 tries in total.
    pub max_attempts: u32,
    /// Fixed pause between attempts. Deliberately not exponential: the
    /// second retry of an asset download gains nothing from waiting longer.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// How many retries have happened; 0 during the initial attempt.
    pub attempt: u32,
}

impl RetryState {
    pub fn next(self) -> Self {
        RetryState {
            attempt: self.attempt + 1,
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// The loop ran to a result; `state.attempt` is the number of retries
    /// that were consumed. A failure here is terminal and reported once.
    Completed { state: RetryState, result: Result<T, E> },
    /// The owning session was superseded; nothing may be reported.
    Superseded,
}

/// Drives `op` until it succeeds, the bound is exhausted or the session dies.
///
/// `is_live` is consulted immediately before every externally visible step,
/// in particular after each delay: timers are not cancelled on supersession,
/// so a stale timer firing must find nothing left to do.
/// `on_retry` runs right before each pause so the caller can surface the
/// retrying state.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut is_live: impl FnMut() -> bool,
    mut on_retry: impl FnMut(RetryState),
    mut op: F,
) -> RetryOutcome<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut state = RetryState::default();
    loop {
        if !is_live() {
            return RetryOutcome::Superseded;
        }

        match op().await {
            Ok(value) => {
                return RetryOutcome::Completed {
                    state,
                    result: Ok(value),
                };
            }
            Err(error) => {
                if state.attempt >= policy.max_attempts {
                    if !is_live() {
                        return RetryOutcome::Superseded;
                    }
                    return RetryOutcome::Completed {
                        state,
                        result: Err(error),
                    };
                }

                state = state.next();
                debug!(
                    "attempt failed ({error}), retry {}/{} in {:?}",
                    state.attempt, policy.max_attempts, policy.base_delay
                );
                if !is_live() {
                    return RetryOutcome::Superseded;
                }
                on_retry(state);
                tokio::time::sleep(policy.base_delay).await;
                if !is_live() {
                    return RetryOutcome::Superseded;
                }
            }
        }
    }
}
