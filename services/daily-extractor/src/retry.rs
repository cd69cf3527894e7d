//! Explicit retry state machine for per-file downloads.
//!
//! The transition function is pure; the download loop interprets states and
//! owns the sleeps. `max_retries` bounds retries after the first attempt,
//! so a file is tried at most `max_retries + 1` times.

use std::time::Duration;

/// Lifecycle of one file's download within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// No attempt made yet.
    Pending,
    /// `n` attempts have failed; another will be made after backoff.
    Retrying(u32),
    /// Verified-complete download.
    Succeeded { attempts: u32 },
    /// Retries exhausted.
    Failed { attempts: u32, error: String },
}

impl RetryState {
    /// Whether no further attempts will be made.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Succeeded { .. } | RetryState::Failed { .. })
    }
}

/// Outcome of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Error(String),
}

/// Advance the state machine on an attempt outcome. Terminal states are
/// absorbing.
pub fn advance(state: &RetryState, outcome: AttemptOutcome, max_retries: u32) -> RetryState {
    let failed_so_far = match state {
        RetryState::Pending => 0,
        RetryState::Retrying(n) => *n,
        terminal => return terminal.clone(),
    };

    match outcome {
        AttemptOutcome::Success => RetryState::Succeeded {
            attempts: failed_so_far + 1,
        },
        AttemptOutcome::Error(error) => {
            let failures = failed_so_far + 1;
            if failures > max_retries {
                RetryState::Failed {
                    attempts: failures,
                    error,
                }
            } else {
                RetryState::Retrying(failures)
            }
        }
    }
}

/// Backoff before the next attempt after `failures` failed ones:
/// `2^(failures-1)` seconds, capped.
pub fn backoff(failures: u32, max: Duration) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    Duration::from_secs(1u64 << exponent).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(msg: &str) -> AttemptOutcome {
        AttemptOutcome::Error(msg.to_string())
    }

    #[test]
    fn test_first_attempt_success() {
        let state = advance(&RetryState::Pending, AttemptOutcome::Success, 3);
        assert_eq!(state, RetryState::Succeeded { attempts: 1 });
    }

    #[test]
    fn test_success_after_retries() {
        let mut state = RetryState::Pending;
        state = advance(&state, err("timeout"), 3);
        state = advance(&state, err("timeout"), 3);
        assert_eq!(state, RetryState::Retrying(2));

        state = advance(&state, AttemptOutcome::Success, 3);
        assert_eq!(state, RetryState::Succeeded { attempts: 3 });
    }

    #[test]
    fn test_exhausted_retries_record_all_attempts() {
        let max_retries = 3;
        let mut state = RetryState::Pending;
        for _ in 0..=max_retries {
            assert!(!state.is_terminal());
            state = advance(&state, err("HTTP 503"), max_retries);
        }

        // max_retries + 1 total attempts, then terminal failure.
        assert_eq!(
            state,
            RetryState::Failed {
                attempts: max_retries + 1,
                error: "HTTP 503".to_string()
            }
        );
    }

    #[test]
    fn test_zero_retries_fails_on_first_error() {
        let state = advance(&RetryState::Pending, err("refused"), 0);
        assert_eq!(
            state,
            RetryState::Failed {
                attempts: 1,
                error: "refused".to_string()
            }
        );
    }

    #[test]
    fn test_terminal_states_absorb() {
        let failed = RetryState::Failed {
            attempts: 4,
            error: "x".to_string(),
        };
        assert_eq!(advance(&failed, AttemptOutcome::Success, 3), failed);

        let succeeded = RetryState::Succeeded { attempts: 1 };
        assert_eq!(advance(&succeeded, err("late"), 3), succeeded);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let max = Duration::from_secs(120);
        assert_eq!(backoff(1, max), Duration::from_secs(1));
        assert_eq!(backoff(2, max), Duration::from_secs(2));
        assert_eq!(backoff(3, max), Duration::from_secs(4));
        assert_eq!(backoff(8, max), Duration::from_secs(120));
        // Large failure counts must not overflow the shift.
        assert_eq!(backoff(64, max), Duration::from_secs(120));
    }
}
