// ── Supervisor loop ──
//
// Background poll loop: keeps a session alive, publishes the normalized
// status every cycle and drives the pending command toward satisfaction.
// Nothing in here is fatal; failures are logged and retried next cycle.

use mowctl_api::Error;
use tracing::{debug, error, info, warn};

use crate::config::{Credentials, SupervisorConfig};
use crate::controller::Controller;
use crate::device::DeviceApi;
use crate::model::{self, MowerStatus};
use crate::reconcile::{Reconciliation, reconcile};

/// What a single cycle observed and decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub status: MowerStatus,
    /// `None` when no command was pending.
    pub reconciliation: Option<Reconciliation>,
}

/// Owns the device session and is the only writer of published status.
pub struct Supervisor<D> {
    device: D,
    controller: Controller,
    credentials: Credentials,
    logout_on_exit: bool,
}

impl<D: DeviceApi> Supervisor<D> {
    pub fn new(device: D, controller: Controller, config: SupervisorConfig) -> Self {
        Self {
            device,
            controller,
            credentials: config.credentials,
            logout_on_exit: config.logout_on_exit,
        }
    }

    /// Authenticate. Failures are logged and reported as `false`; the next
    /// recoverable cycle error retries.
    pub async fn login(&mut self) -> bool {
        match self
            .device
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(()) => {
                debug!(user = %self.credentials.username, "session established");
                true
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                false
            }
        }
    }

    /// Run until shutdown is requested, then log out if configured.
    pub async fn run(mut self) {
        info!(
            poll_secs = self.controller.poll_interval().as_secs(),
            "supervisor started"
        );
        self.login().await;

        loop {
            match self.cycle().await {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "poll failed, re-authenticating");
                    self.login().await;
                }
                Err(e) => error!(error = %e, "poll failed, skipping cycle"),
            }

            if self.controller.should_stop() {
                break;
            }
            let interval = self.controller.poll_interval();
            tokio::select! {
                biased;
                () = self.controller.shutdown_requested() => {}
                () = tokio::time::sleep(interval) => {}
            }
            if self.controller.should_stop() {
                break;
            }
        }

        if self.logout_on_exit {
            if let Err(e) = self.device.logout().await {
                warn!(error = %e, "logout failed");
            }
        }
        info!("supervisor stopped");
    }

    /// One poll-publish-reconcile pass.
    ///
    /// Returns the fetch or control error unchanged so the caller can decide
    /// whether to re-authenticate. No reconciliation happens when the fetch
    /// fails.
    pub async fn cycle(&mut self) -> Result<Cycle, Error> {
        let snapshot = self.device.fetch_status().await?;

        let status = model::lookup(&snapshot.status_code).unwrap_or_else(|| {
            warn!(code = %snapshot.status_code, "unrecognized mower status");
            MowerStatus::Unknown
        });
        if let Some(fault) = &snapshot.last_error {
            info!(code = fault.code, at = ?fault.at, "mower reported an error");
        }
        debug!(
            code = %snapshot.status_code,
            battery = ?snapshot.battery_percent,
            position = ?snapshot.position,
            "status polled"
        );

        let previous = self.controller.publish(status, snapshot);
        if previous != Some(status) {
            match previous {
                Some(from) => info!(%from, to = %status, "status changed"),
                None => info!(%status, "initial status"),
            }
        }

        let Some(command) = self.controller.pending_command() else {
            return Ok(Cycle {
                status,
                reconciliation: None,
            });
        };

        let outcome = reconcile(command, status);
        match outcome {
            Reconciliation::Satisfied => {
                if self.controller.clear_command(command) {
                    info!(%command, %status, "command satisfied");
                }
            }
            Reconciliation::Blocked => {
                info!(%command, %status, "holding command until the mower settles");
            }
            Reconciliation::Unsatisfiable => {
                error!(%command, %status, "cannot reconcile command in this state");
            }
            Reconciliation::Issue(action) => {
                self.device.send_control(action).await?;
                info!(command = %action, %status, "control command sent");
            }
        }

        Ok(Cycle {
            status,
            reconciliation: Some(outcome),
        })
    }
}
