//! The per-context refresh gate.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use auth_core::StoredSession;
use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bus::{ContextBus, RefreshSignal};
use crate::machine::{RefreshMachine, RefreshMachineInput, RefreshMachineState};
use crate::{RefreshError, RefreshResult};

/// Callback invoked with the fresh session so in-memory credential headers
/// can be updated before any retry goes out.
pub type SessionUpdatedCallback = Box<dyn Fn(&StoredSession) + Send + Sync>;

/// Callback invoked after a successful refresh so cached reads re-fetch
/// with the new credential.
pub type ReadsInvalidatedCallback = Box<dyn Fn() + Send + Sync>;

/// Performs the actual refresh round-trips. The production implementation
/// drives the local refresh and user-info endpoints; tests substitute
/// counting fakes.
pub trait SessionRefresher: Send + Sync {
    /// Hit the refresh endpoint. The refresh cookie identifies the caller;
    /// no body is required.
    fn refresh(&self) -> impl Future<Output = RefreshResult<()>> + Send;

    /// Fetch the freshly minted session from the user-info endpoint.
    fn fetch_session(&self) -> impl Future<Output = RefreshResult<StoredSession>> + Send;
}

/// Timing knobs for the gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum spacing between refresh attempts from this context.
    pub cooldown: Duration,
    /// How long a foreign advisory lock is honored without confirmation.
    pub lock_ttl: Duration,
    /// How long a waiter follows an in-flight refresh before giving up.
    pub wait_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5),
            lock_ttl: Duration::from_secs(10),
            wait_timeout: Duration::from_secs(10),
        }
    }
}

/// A foreign context's advisory lock, aged from when we observed it rather
/// than from the sender's clock.
struct ForeignLock {
    owner: Uuid,
    observed_at: Instant,
}

struct GateState {
    machine: RefreshMachine,
    redirecting: bool,
    last_refresh: Option<Instant>,
    /// Receiver for the outcome of the refresh currently in flight in this
    /// context, when there is one.
    in_flight: Option<watch::Receiver<Option<bool>>>,
    foreign_lock: Option<ForeignLock>,
}

enum Action {
    Wait(watch::Receiver<Option<bool>>),
    Run(watch::Sender<Option<bool>>),
}

/// Single-flight refresh coordinator for one execution context.
///
/// Concurrent callers within the context share one network call: the first
/// caller runs the refresh, everyone else awaits the shared outcome.
/// Contexts on the same [`ContextBus`] additionally yield to each other's
/// advisory locks. Failures latch the gate until [`RefreshGate::reset`]
/// after a fresh login.
pub struct RefreshGate<R: SessionRefresher> {
    context_id: Uuid,
    refresher: R,
    bus: ContextBus,
    signals: tokio::sync::Mutex<broadcast::Receiver<RefreshSignal>>,
    state: Mutex<GateState>,
    config: GateConfig,
    on_session: Mutex<Option<SessionUpdatedCallback>>,
    on_invalidate: Mutex<Option<ReadsInvalidatedCallback>>,
}

impl<R: SessionRefresher> RefreshGate<R> {
    /// Create a gate on the given bus with default timings.
    pub fn new(refresher: R, bus: ContextBus) -> Self {
        Self::with_config(refresher, bus, GateConfig::default())
    }

    /// Create a gate with custom timings.
    pub fn with_config(refresher: R, bus: ContextBus, config: GateConfig) -> Self {
        let signals = tokio::sync::Mutex::new(bus.subscribe());
        Self {
            context_id: Uuid::new_v4(),
            refresher,
            bus,
            signals,
            state: Mutex::new(GateState {
                machine: RefreshMachine::new(),
                redirecting: false,
                last_refresh: None,
                in_flight: None,
                foreign_lock: None,
            }),
            config,
            on_session: Mutex::new(None),
            on_invalidate: Mutex::new(None),
        }
    }

    /// This context's identity on the bus.
    pub fn context_id(&self) -> Uuid {
        self.context_id
    }

    /// Whether the failure latch is set.
    pub fn is_latched(&self) -> bool {
        let state = self.state.lock().unwrap();
        *state.machine.state() == RefreshMachineState::Latched || state.redirecting
    }

    /// Register the session-update hook.
    pub fn set_session_callback(&self, callback: SessionUpdatedCallback) {
        *self.on_session.lock().unwrap() = Some(callback);
    }

    /// Register the cache-invalidation hook.
    pub fn set_invalidate_callback(&self, callback: ReadsInvalidatedCallback) {
        *self.on_invalidate.lock().unwrap() = Some(callback);
    }

    /// Clear the failure latch and cooldown after a fresh login.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        if *state.machine.state() == RefreshMachineState::Latched {
            state
                .machine
                .consume(&RefreshMachineInput::Reset)
                .expect("Reset is valid from Latched");
        }
        state.redirecting = false;
        state.last_refresh = None;
        state.foreign_lock = None;
        info!(context = %self.context_id, "Refresh gate reset after new login");
    }

    /// Refresh the session, coordinating with concurrent callers and other
    /// contexts.
    ///
    /// At most one refresh network call is ever in flight in this context;
    /// late callers await its outcome and then read the updated session.
    pub async fn refresh(&self) -> RefreshResult<StoredSession> {
        self.drain_signals().await;

        let action = self.decide()?;
        match action {
            Action::Wait(rx) => self.await_in_flight(rx).await,
            Action::Run(tx) => self.run_refresh(tx).await,
        }
    }

    /// Apply steps 1-4 of the algorithm under the state lock and decide
    /// whether to run, wait, or reject.
    fn decide(&self) -> RefreshResult<Action> {
        let mut state = self.state.lock().unwrap();

        if *state.machine.state() == RefreshMachineState::Latched || state.redirecting {
            debug!(context = %self.context_id, "Rejecting refresh: latched");
            return Err(RefreshError::Latched);
        }

        if let Some(rx) = &state.in_flight {
            debug!(context = %self.context_id, "Joining in-flight refresh");
            return Ok(Action::Wait(rx.clone()));
        }

        if let Some(last) = state.last_refresh {
            if last.elapsed() < self.config.cooldown {
                debug!(context = %self.context_id, "Rejecting refresh: cooldown");
                return Err(RefreshError::Cooldown);
            }
        }

        if let Some(lock) = &state.foreign_lock {
            if lock.observed_at.elapsed() < self.config.lock_ttl {
                debug!(
                    context = %self.context_id,
                    owner = %lock.owner,
                    "Yielding to another context's refresh lock"
                );
                return Err(RefreshError::LockHeld);
            }
            // The owner never confirmed; its lock has expired.
            state.foreign_lock = None;
        }

        state
            .machine
            .consume(&RefreshMachineInput::Begin)
            .expect("Begin is valid from Idle");
        state.last_refresh = Some(Instant::now());

        let (tx, rx) = watch::channel(None);
        state.in_flight = Some(rx);
        Ok(Action::Run(tx))
    }

    /// Follow the in-flight refresh and resolve with its outcome.
    async fn await_in_flight(&self, mut rx: watch::Receiver<Option<bool>>) -> RefreshResult<StoredSession> {
        let waited = tokio::time::timeout(self.config.wait_timeout, rx.wait_for(|o| o.is_some()));

        let succeeded = match waited.await {
            Err(_) => {
                warn!(context = %self.context_id, "Timed out waiting for in-flight refresh");
                return Err(RefreshError::Timeout);
            }
            // The running caller dropped the sender without an outcome;
            // treat it like a failed refresh.
            Ok(Err(_)) => false,
            Ok(Ok(outcome)) => (*outcome).expect("wait_for only returns once the outcome is set"),
        };

        if succeeded {
            self.refresher.fetch_session().await
        } else {
            Err(RefreshError::Latched)
        }
    }

    /// Run the refresh network call and fan the outcome out to waiters and
    /// other contexts.
    async fn run_refresh(&self, tx: watch::Sender<Option<bool>>) -> RefreshResult<StoredSession> {
        self.bus.publish(RefreshSignal::LockAcquired {
            owner: self.context_id,
            acquired_at: Utc::now(),
        });
        info!(context = %self.context_id, "Refreshing session");

        let result = async {
            self.refresher.refresh().await?;
            self.refresher.fetch_session().await
        }
        .await;

        // Clearing the in-flight marker and confirming the advisory lock
        // happen on both paths before the outcome is returned.
        match result {
            Ok(session) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state
                        .machine
                        .consume(&RefreshMachineInput::Succeed)
                        .expect("Succeed is valid from InFlight");
                    state.in_flight = None;
                }

                if let Some(callback) = self.on_session.lock().unwrap().as_ref() {
                    callback(&session);
                }
                self.bus.publish(RefreshSignal::RefreshSucceeded {
                    owner: self.context_id,
                });
                if let Some(callback) = self.on_invalidate.lock().unwrap().as_ref() {
                    callback();
                }

                let _ = tx.send(Some(true));
                info!(context = %self.context_id, "Session refreshed");
                Ok(session)
            }
            Err(error) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state
                        .machine
                        .consume(&RefreshMachineInput::Fail)
                        .expect("Fail is valid from InFlight");
                    state.redirecting = true;
                    state.in_flight = None;
                }

                self.bus.publish(RefreshSignal::RefreshFailed {
                    owner: self.context_id,
                });

                let _ = tx.send(Some(false));
                warn!(context = %self.context_id, error = %error, "Refresh failed; gate latched");
                Err(error)
            }
        }
    }

    /// Pull pending bus signals and update the foreign-lock view.
    async fn drain_signals(&self) {
        let mut rx = self.signals.lock().await;
        loop {
            match rx.try_recv() {
                Ok(signal) => self.apply_signal(signal),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(context = %self.context_id, skipped, "Signal receiver lagged");
                }
                Err(_) => break,
            }
        }
    }

    fn apply_signal(&self, signal: RefreshSignal) {
        if signal.owner() == self.context_id {
            return;
        }

        let mut state = self.state.lock().unwrap();
        match signal {
            RefreshSignal::LockAcquired { owner, .. } => {
                state.foreign_lock = Some(ForeignLock {
                    owner,
                    observed_at: Instant::now(),
                });
            }
            RefreshSignal::RefreshSucceeded { owner } | RefreshSignal::RefreshFailed { owner } => {
                if state
                    .foreign_lock
                    .as_ref()
                    .is_some_and(|lock| lock.owner == owner)
                {
                    state.foreign_lock = None;
                }
            }
        }
    }
}
