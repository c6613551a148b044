// ── Controller facade ──
//
// Caller-facing handle over the supervisor loop. Callers set the pending
// command or read status through the shared state, then block (bounded)
// until the loop publishes something that answers them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{MIN_POLL_INTERVAL, SupervisorConfig};
use crate::device::DeviceApi;
use crate::model::{Command, DeviceSnapshot, MowerStatus, StatusReport};
use crate::reconcile::is_satisfied;
use crate::state::SupervisorState;
use crate::supervisor::Supervisor;

/// Lower bound on the wait re-check period.
const MIN_RECHECK: Duration = Duration::from_millis(50);

/// Cap applied when a caller passes an effectively unbounded timeout.
const MAX_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// ── Controller ───────────────────────────────────────────────────

/// Cheaply cloneable handle over the shared supervisor state.
///
/// [`spawn`](Self::spawn) starts the background [`Supervisor`] and hands back
/// a `Controller`; every clone observes the same state. Nothing here calls
/// the device: commands are fulfilled by the loop.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: Mutex<SupervisorState>,
    /// Bumped on every status publish so waiters wake without spinning.
    revision: watch::Sender<u64>,
    shutdown: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Create the shared state without starting a loop.
    ///
    /// Pair it with [`Supervisor::new`] to drive cycles by hand.
    pub fn new(poll_interval: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(SupervisorState::new(poll_interval)),
                revision,
                shutdown: Notify::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Start a supervisor for `device` on the current tokio runtime.
    pub fn spawn<D>(config: SupervisorConfig, device: D) -> Self
    where
        D: DeviceApi + 'static,
    {
        let controller = Self::new(config.poll_interval);
        let supervisor = Supervisor::new(device, controller.clone(), config);
        let handle = tokio::spawn(supervisor.run());
        *controller.inner.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        controller
    }

    // ── Caller operations ────────────────────────────────────────

    /// Make `command` the pending command and wait until the device reports
    /// a status that satisfies it.
    ///
    /// A later submission replaces this one. Returns `false` once `timeout`
    /// elapses.
    pub async fn submit_command(&self, command: Command, timeout: Duration) -> bool {
        {
            let mut state = self.lock();
            let replaced = state.command.replace(command).filter(|p| *p != command);
            if let Some(previous) = replaced {
                debug!(%previous, %command, "pending command replaced");
            }
        }
        info!(%command, timeout_secs = timeout.as_secs(), "command submitted");

        self.wait_for(timeout, |state| {
            state
                .status
                .filter(|status| is_satisfied(command, *status))
        })
        .await
        .is_some()
    }

    /// Wait until a status has been published, up to `timeout`.
    ///
    /// With a zero timeout this only reads the current value.
    pub async fn status(&self, timeout: Duration) -> Option<MowerStatus> {
        self.wait_for(timeout, |state| state.status).await
    }

    /// Like [`status`](Self::status) but returns the pending command and the
    /// last snapshot alongside.
    pub async fn report(&self, timeout: Duration) -> Option<StatusReport> {
        self.wait_for(timeout, |state| {
            state.status.map(|status| StatusReport {
                status,
                pending_command: state.command,
                snapshot: state.snapshot.clone(),
            })
        })
        .await
    }

    /// The most recent device snapshot, if any poll has succeeded.
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn pending_command(&self) -> Option<Command> {
        self.lock().command
    }

    pub fn poll_interval(&self) -> Duration {
        self.lock().poll_interval
    }

    /// Change the delay between cycles. Applies from the next sleep.
    ///
    /// Values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn set_poll_interval(&self, interval: Duration) {
        self.lock().poll_interval = interval.max(MIN_POLL_INTERVAL);
    }

    /// Ask the loop to exit after its current cycle. Does not wait.
    pub fn request_shutdown(&self) {
        self.lock().stop = true;
        self.inner.shutdown.notify_one();
    }

    /// Wait for the supervisor task to finish.
    ///
    /// Returns immediately if no task was spawned or it was already joined.
    pub async fn join(&self) {
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if let Err(e) = handle.await {
            warn!(error = %e, "supervisor task ended abnormally");
        }
    }

    /// Request shutdown and wait for the loop to exit.
    pub async fn shutdown(&self) {
        self.request_shutdown();
        self.join().await;
    }

    // ── Supervisor side ──────────────────────────────────────────

    /// Publish a freshly polled status and snapshot. Returns the previous
    /// status.
    pub(crate) fn publish(
        &self,
        status: MowerStatus,
        snapshot: DeviceSnapshot,
    ) -> Option<MowerStatus> {
        let previous = {
            let mut state = self.lock();
            state.snapshot = Some(snapshot);
            state.status.replace(status)
        };
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        previous
    }

    /// Clear the pending command if it is still `evaluated`.
    ///
    /// A command submitted after the evaluation is left in place.
    pub(crate) fn clear_command(&self, evaluated: Command) -> bool {
        let mut state = self.lock();
        if state.command == Some(evaluated) {
            state.command = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.lock().stop
    }

    /// Resolves once [`request_shutdown`](Self::request_shutdown) has been
    /// called, including calls made before this future was created.
    pub(crate) async fn shutdown_requested(&self) {
        self.inner.shutdown.notified().await;
    }

    // ── Internals ────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, SupervisorState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-evaluate `probe` until it yields a value or `timeout` elapses.
    ///
    /// Wakes on every publish, and at least every half poll interval.
    async fn wait_for<T>(
        &self,
        timeout: Duration,
        mut probe: impl FnMut(&SupervisorState) -> Option<T>,
    ) -> Option<T> {
        let started = Instant::now();
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + MAX_WAIT);
        let mut revisions = self.inner.revision.subscribe();

        loop {
            let (found, recheck) = {
                let state = self.lock();
                (probe(&state), state.poll_interval / 2)
            };
            if found.is_some() {
                return found;
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let wake = now
                .checked_add(recheck.max(MIN_RECHECK))
                .map_or(deadline, |tick| tick.min(deadline));

            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        tokio::time::sleep_until(wake).await;
                    }
                }
                () = tokio::time::sleep_until(wake) => {}
            }
        }
    }
}
