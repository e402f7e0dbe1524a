//! Retry policy for polling.
//!
//! A refresh cycle makes up to [`MAX_ATTEMPTS`] poll attempts. After
//! [`RECONNECT_AFTER_FAILURES`] consecutive failures the session is rebuilt
//! once, which recovers silently expired tokens. Attempts within a cycle
//! follow each other immediately; pacing is the scheduler's job.

/// Consecutive failures after which the session is rebuilt.
pub const RECONNECT_AFTER_FAILURES: u32 = 5;

/// Attempts per refresh cycle before giving up.
pub const MAX_ATTEMPTS: u32 = 10;

// ============================================================================
// Retry State
// ============================================================================

/// Where a refresh cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryState {
    /// About to make poll attempt `attempt` (1-based).
    Polling {
        /// Attempt about to be made.
        attempt: u32,
    },
    /// Reconnect before making attempt `next_attempt`.
    ReconnectingMidRetry {
        /// Attempt made once the reconnect is done.
        next_attempt: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// Number of failed attempts.
        attempts: u32,
    },
}

impl RetryState {
    /// Returns true once no further attempt may be made.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Thresholds of the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures after which the session is rebuilt.
    pub reconnect_after: u32,
    /// Attempts per cycle.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy with custom thresholds.
    pub const fn new(reconnect_after: u32, max_attempts: u32) -> Self {
        Self {
            reconnect_after,
            max_attempts,
        }
    }

    /// State at the start of a cycle.
    pub const fn start(&self) -> RetryState {
        RetryState::Polling { attempt: 1 }
    }

    /// Transition after a failed poll attempt.
    pub fn on_failure(&self, state: RetryState) -> RetryState {
        let failed = match state {
            RetryState::Polling { attempt } => attempt,
            // A reconnect is not an attempt; stay put.
            RetryState::ReconnectingMidRetry { .. } | RetryState::Exhausted { .. } => return state,
        };

        if failed >= self.max_attempts {
            RetryState::Exhausted { attempts: failed }
        } else if failed == self.reconnect_after {
            RetryState::ReconnectingMidRetry {
                next_attempt: failed + 1,
            }
        } else {
            RetryState::Polling {
                attempt: failed + 1,
            }
        }
    }

    /// Transition once the mid-cycle reconnect has been tried.
    ///
    /// Whether the reconnect worked does not change the attempt count.
    pub fn after_reconnect(&self, state: RetryState) -> RetryState {
        match state {
            RetryState::ReconnectingMidRetry { next_attempt } => RetryState::Polling {
                attempt: next_attempt,
            },
            other => other,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RECONNECT_AFTER_FAILURES, MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_after_fifth_failure() {
        let policy = RetryPolicy::default();
        let mut state = policy.start();

        for _ in 0..4 {
            state = policy.on_failure(state);
        }
        assert_eq!(state, RetryState::Polling { attempt: 5 });

        state = policy.on_failure(state);
        assert_eq!(state, RetryState::ReconnectingMidRetry { next_attempt: 6 });

        state = policy.after_reconnect(state);
        assert_eq!(state, RetryState::Polling { attempt: 6 });
    }

    #[test]
    fn test_exhausted_after_tenth_failure() {
        let policy = RetryPolicy::default();
        let mut state = policy.start();
        let mut attempts = 0;
        let mut reconnects = 0;

        while let RetryState::Polling { .. } | RetryState::ReconnectingMidRetry { .. } = state {
            if let RetryState::ReconnectingMidRetry { .. } = state {
                reconnects += 1;
                state = policy.after_reconnect(state);
                continue;
            }
            attempts += 1;
            state = policy.on_failure(state);
        }

        assert_eq!(attempts, 10);
        assert_eq!(reconnects, 1);
        assert_eq!(state, RetryState::Exhausted { attempts: 10 });
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let policy = RetryPolicy::default();
        let done = RetryState::Exhausted { attempts: 10 };
        assert_eq!(policy.on_failure(done), done);
        assert_eq!(policy.after_reconnect(done), done);
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = RetryPolicy::new(1, 2);
        let state = policy.on_failure(policy.start());
        assert_eq!(state, RetryState::ReconnectingMidRetry { next_attempt: 2 });
        let state = policy.on_failure(policy.after_reconnect(state));
        assert_eq!(state, RetryState::Exhausted { attempts: 2 });
    }
}
