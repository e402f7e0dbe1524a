//! Periodic refresh of one bike.
//!
//! [`PollingCoordinator`] owns the client behind an async mutex. A refresh
//! holds the lock for its whole retry cycle, so refreshes never overlap and
//! actions wait for a running refresh to finish. The published snapshot is
//! only replaced when a poll fully succeeds.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use stromer_core::{BikeSnapshot, LightMode};
use stromer_fetch::{ApiError, BikeApi, ErrorKind, RetryPolicy, RetryState};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, instrument, warn, Span};

use crate::error::CoordinatorError;

// ============================================================================
// Health
// ============================================================================

/// Integration health as shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Health {
    /// No refresh has succeeded yet.
    #[default]
    NotReady,
    /// The last refresh succeeded.
    Ready,
    /// Scheduled refreshes have stopped.
    Unavailable,
    /// Polling gave up; new credentials are needed.
    AuthFailed,
}

/// Receiver side of the published snapshot.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<BikeSnapshot>>>;

// ============================================================================
// Coordinator
// ============================================================================

/// Keeps the last-known snapshot of one bike fresh.
pub struct PollingCoordinator<C: BikeApi> {
    client: Mutex<C>,
    bike_id: String,
    policy: RetryPolicy,
    snapshot: watch::Sender<Option<Arc<BikeSnapshot>>>,
    health: Arc<watch::Sender<Health>>,
    last_success: std::sync::Mutex<Option<DateTime<Utc>>>,
    span: Span,
}

impl<C: BikeApi> PollingCoordinator<C> {
    /// Creates a coordinator for `bike_id` around a connected client.
    pub fn new(client: C, bike_id: impl Into<String>) -> Self {
        let bike_id = bike_id.into();
        let span = info_span!("coordinator", bike_id = %bike_id);
        let (snapshot, _) = watch::channel(None);
        let (health, _) = watch::channel(Health::NotReady);
        Self {
            client: Mutex::new(client),
            bike_id,
            policy: RetryPolicy::default(),
            snapshot,
            health: Arc::new(health),
            last_success: std::sync::Mutex::new(None),
            span,
        }
    }

    /// Sets the span all refresh activity is recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Replaces the retry thresholds.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The bike this coordinator follows.
    pub fn bike_id(&self) -> &str {
        &self.bike_id
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// The last published snapshot.
    pub fn snapshot(&self) -> Option<Arc<BikeSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshot.subscribe()
    }

    /// Current health.
    pub fn health(&self) -> Health {
        *self.health.borrow()
    }

    /// Subscribes to health changes.
    pub fn subscribe_health(&self) -> watch::Receiver<Health> {
        self.health.subscribe()
    }

    /// When a refresh last succeeded.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success.lock().ok().and_then(|guard| *guard)
    }

    fn set_health(&self, health: Health) {
        let previous = self.health.send_replace(health);
        if previous != health {
            info!(parent: &self.span, ?previous, current = ?health, "Health changed");
        }
    }

    fn publish(&self, snapshot: BikeSnapshot) -> Arc<BikeSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshot.send_replace(Some(Arc::clone(&snapshot)));
        if let Ok(mut last) = self.last_success.lock() {
            *last = Some(snapshot.fetched_at);
        }
        snapshot
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Runs the first refresh.
    ///
    /// Must succeed before the coordinator is usable; on failure the health
    /// stays [`Health::NotReady`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NotReady`] wrapping the cycle's failure.
    pub async fn first_refresh(&self) -> Result<Arc<BikeSnapshot>, CoordinatorError> {
        let mut client = self.client.lock().await;
        self.run_cycle(&mut *client).await.map_err(|e| {
            self.set_health(Health::NotReady);
            CoordinatorError::NotReady {
                reason: e.to_string(),
            }
        })
    }

    /// Runs one refresh cycle and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::AuthenticationFailed`] when every attempt
    /// failed or the mid-cycle reconnect was rejected; health then becomes
    /// [`Health::AuthFailed`].
    pub async fn refresh(&self) -> Result<Arc<BikeSnapshot>, CoordinatorError> {
        let mut client = self.client.lock().await;
        self.run_cycle(&mut *client).await.inspect_err(|e| {
            if e.is_auth_failure() {
                self.set_health(Health::AuthFailed);
            }
        })
    }

    /// Runs the retry cycle. Publishes and marks health ready on success;
    /// failures leave health to the caller.
    #[instrument(parent = &self.span, skip_all)]
    async fn run_cycle(&self, client: &mut C) -> Result<Arc<BikeSnapshot>, CoordinatorError> {
        let policy = self.policy;
        let mut state = policy.start();
        let mut last_error = None;

        loop {
            match state {
                RetryState::Polling { attempt } => match client.poll(&self.bike_id).await {
                    Ok(snapshot) => {
                        debug!(attempt, fields = snapshot.len(), "Poll succeeded");
                        let snapshot = self.publish(snapshot);
                        self.set_health(Health::Ready);
                        return Ok(snapshot);
                    }
                    Err(e) => {
                        warn!(
                            attempt,
                            max_attempts = policy.max_attempts,
                            error = %e,
                            "Poll failed"
                        );
                        last_error = Some(e);
                        state = policy.on_failure(state);
                    }
                },
                RetryState::ReconnectingMidRetry { next_attempt } => {
                    info!(next_attempt, "Reconnecting before next attempt");
                    match client.connect().await {
                        Ok(_) => debug!("Reconnected"),
                        Err(e) if e.kind() == ErrorKind::Authentication => {
                            error!(error = %e, "Reconnect rejected");
                            return Err(CoordinatorError::AuthenticationFailed {
                                attempts: next_attempt - 1,
                                source: e,
                            });
                        }
                        Err(e) => warn!(error = %e, "Reconnect failed"),
                    }
                    state = policy.after_reconnect(state);
                }
                RetryState::Exhausted { attempts } => {
                    error!(attempts, "Giving up on bike after repeated failures");
                    return Err(CoordinatorError::AuthenticationFailed {
                        attempts,
                        source: last_error.unwrap_or(ApiError::NotConnected),
                    });
                }
            }
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Locks or unlocks the bike, then refreshes.
    ///
    /// # Errors
    ///
    /// Returns the client error if the action was not acknowledged. A failed
    /// follow-up refresh is logged and does not fail the action.
    pub async fn set_lock(&self, locked: bool) -> Result<(), CoordinatorError> {
        let mut client = self.client.lock().await;
        client.set_lock(&self.bike_id, locked).await?;
        self.refresh_after_action(&mut *client, "lock").await;
        Ok(())
    }

    /// Switches the light, then refreshes.
    ///
    /// # Errors
    ///
    /// Returns the client error if the action was not acknowledged.
    pub async fn set_light(&self, mode: LightMode) -> Result<(), CoordinatorError> {
        let mut client = self.client.lock().await;
        client.set_light(&self.bike_id, mode).await?;
        self.refresh_after_action(&mut *client, "light").await;
        Ok(())
    }

    /// Clears the trip counters, then refreshes.
    ///
    /// # Errors
    ///
    /// Returns the client error if the action was not acknowledged.
    pub async fn reset_trip_data(&self) -> Result<(), CoordinatorError> {
        let mut client = self.client.lock().await;
        client.reset_trip_data(&self.bike_id).await?;
        self.refresh_after_action(&mut *client, "reset trip data").await;
        Ok(())
    }

    /// Health is left as it was when this refresh fails; the scheduled
    /// refresh reports persistent failures on its own.
    async fn refresh_after_action(&self, client: &mut C, action: &'static str) {
        if let Err(e) = self.run_cycle(client).await {
            warn!(parent: &self.span, action, error = %e, "Refresh after action failed");
        }
    }

    /// Tears the client session down.
    pub async fn disconnect(&self) {
        self.client.lock().await.disconnect().await;
    }
}

// ============================================================================
// Scheduled refresh
// ============================================================================

impl<C: BikeApi + 'static> PollingCoordinator<C> {
    /// Starts refreshing every `period` on the tokio runtime.
    ///
    /// The first tick fires one `period` from now; run
    /// [`first_refresh`](Self::first_refresh) before spawning. The task stops
    /// on its own after an authentication failure.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let coordinator = Arc::clone(self);
        let span = self.span.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match coordinator.refresh().await {
                    Ok(_) => {}
                    Err(e) if e.is_auth_failure() => {
                        error!(parent: &span, error = %e, "Stopping scheduled refresh");
                        break;
                    }
                    Err(e) => warn!(parent: &span, error = %e, "Scheduled refresh failed"),
                }
            }
        });

        info!(parent: &self.span, period_secs = period.as_secs(), "Scheduled refresh started");
        RefreshHandle {
            task,
            health: Arc::clone(&self.health),
        }
    }
}

/// Handle to a scheduled refresh task.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
    health: Arc<watch::Sender<Health>>,
}

impl RefreshHandle {
    /// Returns true once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task, abandoning any refresh in flight.
    ///
    /// The last published snapshot stays visible.
    pub async fn shutdown(self) {
        self.task.abort();
        // Cancellation surfaces as a JoinError; nothing to report.
        let _ = self.task.await;
        self.health.send_replace(Health::Unavailable);
    }
}
