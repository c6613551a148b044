#![allow(clippy::unwrap_used)]

// Supervisor loop and controller facade against a scripted device.
//
// Time is paused: tokio auto-advances the clock whenever every task is idle,
// so poll intervals and facade timeouts resolve instantly but in order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mowctl_api::Error;
use mowctl_core::{
    Command, Controller, Credentials, DeviceApi, DeviceSnapshot, MowerStatus, Reconciliation,
    Supervisor, SupervisorConfig,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;

const POLL: Duration = Duration::from_secs(10);

// ── Fake device ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Step {
    Status(&'static str),
    /// HTTP 503 from the cloud.
    Unavailable,
    /// A body that does not decode.
    Garbled,
}

#[derive(Default)]
struct Shared {
    steps: VecDeque<Step>,
    last: Option<Step>,
    failing_controls: usize,
    failing_logins: usize,
    /// Set by a rejected login; polls fail until a login succeeds.
    signed_out: bool,
    logins: usize,
    polls: usize,
    controls: Vec<Command>,
    logouts: usize,
}

#[derive(Clone, Default)]
struct FakeDevice {
    shared: Arc<Mutex<Shared>>,
}

impl FakeDevice {
    fn scripted(steps: &[Step]) -> Self {
        let device = Self::default();
        device.shared.lock().unwrap().steps = steps.iter().copied().collect();
        device
    }

    fn rejecting_logins(self, count: usize) -> Self {
        self.shared.lock().unwrap().failing_logins = count;
        self
    }

    fn logins(&self) -> usize {
        self.shared.lock().unwrap().logins
    }

    fn polls(&self) -> usize {
        self.shared.lock().unwrap().polls
    }

    fn controls(&self) -> Vec<Command> {
        self.shared.lock().unwrap().controls.clone()
    }

    fn logouts(&self) -> usize {
        self.shared.lock().unwrap().logouts
    }
}

#[async_trait]
impl DeviceApi for FakeDevice {
    async fn login(&mut self, _username: &str, _password: &SecretString) -> Result<(), Error> {
        let mut shared = self.shared.lock().unwrap();
        shared.logins += 1;
        if shared.failing_logins > 0 {
            shared.failing_logins -= 1;
            shared.signed_out = true;
            return Err(Error::Authentication {
                message: "login failed (HTTP 503 Service Unavailable)".into(),
            });
        }
        shared.signed_out = false;
        Ok(())
    }

    async fn fetch_status(&mut self) -> Result<DeviceSnapshot, Error> {
        let mut shared = self.shared.lock().unwrap();
        shared.polls += 1;
        if shared.signed_out {
            return Err(Error::NotAuthenticated);
        }
        let step = match shared.steps.pop_front() {
            Some(step) => {
                shared.last = Some(step);
                step
            }
            None => shared.last.unwrap_or(Step::Status("PARKED_TIMER")),
        };
        match step {
            Step::Status(code) => Ok(DeviceSnapshot::from_code(code)),
            Step::Unavailable => Err(Error::Api {
                status: 503,
                message: "Service Unavailable".into(),
            }),
            Step::Garbled => Err(Error::Deserialization {
                message: "missing field `mowerStatus`".into(),
                body: "{}".into(),
            }),
        }
    }

    async fn send_control(&mut self, command: Command) -> Result<(), Error> {
        let mut shared = self.shared.lock().unwrap();
        if shared.failing_controls > 0 {
            shared.failing_controls -= 1;
            return Err(Error::Api {
                status: 500,
                message: "control rejected".into(),
            });
        }
        shared.controls.push(command);
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), Error> {
        self.shared.lock().unwrap().logouts += 1;
        Ok(())
    }
}

fn config() -> SupervisorConfig {
    SupervisorConfig::new(Credentials::new("mower@example.com", "hunter2")).with_poll_interval(POLL)
}

fn manual(device: &FakeDevice) -> (Controller, Supervisor<FakeDevice>) {
    let controller = Controller::new(POLL);
    let supervisor = Supervisor::new(device.clone(), controller.clone(), config());
    (controller, supervisor)
}

/// Set the pending command without waiting on it.
async fn queue(controller: &Controller, command: Command) {
    controller.submit_command(command, Duration::ZERO).await;
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn start_waits_while_searching_then_succeeds_when_mowing() {
    let device = FakeDevice::scripted(&[
        Step::Status("OK_SEARCHING"),
        Step::Status("OK_SEARCHING"),
        Step::Status("OK_CUTTING"),
    ]);
    let controller = Controller::spawn(config(), device.clone());

    let started = tokio::time::Instant::now();
    let satisfied = controller
        .submit_command(Command::Start, Duration::from_secs(30))
        .await;

    assert!(satisfied);
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert!(device.controls().is_empty(), "no START while searching");

    controller.shutdown().await;
    assert_eq!(controller.pending_command(), None);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_triggers_one_reauthentication() {
    let device = FakeDevice::scripted(&[Step::Unavailable, Step::Status("OK_CHARGING")]);
    let controller = Controller::spawn(config(), device.clone());

    let status = controller.status(Duration::from_secs(60)).await;

    assert_eq!(status, Some(MowerStatus::Charging));
    assert_eq!(device.logins(), 2, "initial login plus one re-authentication");
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_startup_login_is_retried_after_the_next_poll() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CHARGING")]).rejecting_logins(1);
    let controller = Controller::spawn(config(), device.clone());
    let started = tokio::time::Instant::now();

    let status = controller.status(Duration::from_secs(60)).await;

    assert_eq!(status, Some(MowerStatus::Charging));
    assert_eq!(device.logins(), 2, "rejected startup login plus one retry");
    assert_eq!(device.polls(), 2, "first poll hits the missing session");
    assert!(started.elapsed() >= POLL);
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn command_is_held_while_mower_is_in_error() {
    let device = FakeDevice::scripted(&[Step::Status("ERROR")]);
    let controller = Controller::spawn(config(), device.clone());

    let started = tokio::time::Instant::now();
    let satisfied = controller
        .submit_command(Command::Stop, Duration::from_secs(30))
        .await;

    assert!(!satisfied);
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert!(device.controls().is_empty());
    assert_eq!(controller.pending_command(), Some(Command::Stop));
    assert_eq!(controller.status(Duration::ZERO).await, Some(MowerStatus::Error));
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_status_before_first_poll_is_none() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CUTTING")]);
    let controller = Controller::spawn(config(), device.clone());

    let started = tokio::time::Instant::now();
    assert_eq!(controller.status(Duration::ZERO).await, None);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(device.polls(), 0);
    controller.shutdown().await;
}

// ── Reconciliation through the loop ─────────────────────────────────

#[tokio::test(start_paused = true)]
async fn satisfied_command_is_not_reissued() {
    let device = FakeDevice::scripted(&[
        Step::Status("PARKED_PARKED_SELECTED"),
        Step::Status("OK_CUTTING"),
        Step::Status("OK_CUTTING"),
    ]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Start).await;

    let first = supervisor.cycle().await.unwrap();
    assert_eq!(first.reconciliation, Some(Reconciliation::Issue(Command::Start)));

    let second = supervisor.cycle().await.unwrap();
    assert_eq!(second.reconciliation, Some(Reconciliation::Satisfied));
    assert_eq!(controller.pending_command(), None);

    let third = supervisor.cycle().await.unwrap();
    assert_eq!(third.status, MowerStatus::Mowing);
    assert_eq!(third.reconciliation, None);
    assert_eq!(device.controls(), vec![Command::Start]);
}

#[tokio::test(start_paused = true)]
async fn latest_submission_wins() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CUTTING")]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Start).await;
    queue(&controller, Command::Stop).await;

    let cycle = supervisor.cycle().await.unwrap();

    assert_eq!(cycle.reconciliation, Some(Reconciliation::Issue(Command::Stop)));
    assert_eq!(device.controls(), vec![Command::Stop]);
    assert_eq!(controller.pending_command(), Some(Command::Stop));
}

#[tokio::test(start_paused = true)]
async fn unsatisfied_command_is_resent_every_cycle() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CUTTING")]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Park).await;

    supervisor.cycle().await.unwrap();
    supervisor.cycle().await.unwrap();

    assert_eq!(device.controls(), vec![Command::Park, Command::Park]);
}

#[tokio::test(start_paused = true)]
async fn unknown_vendor_code_holds_the_command() {
    let device = FakeDevice::scripted(&[Step::Status("OFF_HATCH_OPEN")]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Park).await;

    let cycle = supervisor.cycle().await.unwrap();

    assert_eq!(cycle.status, MowerStatus::Unknown);
    assert_eq!(cycle.reconciliation, Some(Reconciliation::Unsatisfiable));
    assert!(device.controls().is_empty());
    assert_eq!(controller.pending_command(), Some(Command::Park));
}

#[tokio::test(start_paused = true)]
async fn failed_control_call_is_recoverable_and_keeps_the_command() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CUTTING")]);
    device.shared.lock().unwrap().failing_controls = 1;
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Stop).await;

    let err = supervisor.cycle().await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(controller.pending_command(), Some(Command::Stop));
    assert!(device.controls().is_empty());
    assert_eq!(
        controller.status(Duration::ZERO).await,
        Some(MowerStatus::Mowing),
        "status is published before the control call"
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_skips_reconciliation() {
    let device = FakeDevice::scripted(&[Step::Unavailable]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Start).await;

    assert!(supervisor.cycle().await.is_err());
    assert!(device.controls().is_empty());
    assert_eq!(controller.status(Duration::ZERO).await, None);
}

// ── Loop behaviour ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn malformed_payload_does_not_reauthenticate() {
    let device = FakeDevice::scripted(&[Step::Garbled, Step::Status("PAUSED")]);
    let controller = Controller::spawn(config(), device.clone());

    let status = controller.status(Duration::from_secs(60)).await;

    assert_eq!(status, Some(MowerStatus::Paused));
    assert_eq!(device.logins(), 1);
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop_and_logs_out() {
    let device = FakeDevice::scripted(&[Step::Status("PARKED_TIMER")]);
    let controller = Controller::spawn(config(), device.clone());
    assert!(controller.status(Duration::from_secs(5)).await.is_some());

    controller.shutdown().await;
    let polls = device.polls();
    tokio::time::sleep(POLL * 3).await;

    assert_eq!(device.polls(), polls, "no cycles after shutdown");
    assert_eq!(device.logouts(), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_can_be_skipped_on_exit() {
    let device = FakeDevice::scripted(&[Step::Status("PARKED_TIMER")]);
    let controller =
        Controller::spawn(config().with_logout_on_exit(false), device.clone());
    controller.status(Duration::from_secs(5)).await;

    controller.shutdown().await;

    assert_eq!(device.logouts(), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_interval_change_applies_to_next_sleep() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CHARGING")]);
    let controller = Controller::spawn(config(), device.clone());
    controller.set_poll_interval(Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(device.polls(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(device.polls(), 2);
    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn report_includes_snapshot_and_pending_command() {
    let device = FakeDevice::scripted(&[Step::Status("OK_CUTTING")]);
    let (controller, mut supervisor) = manual(&device);
    queue(&controller, Command::Park).await;
    supervisor.cycle().await.unwrap();

    let report = controller.report(Duration::ZERO).await.unwrap();

    assert_eq!(report.status, MowerStatus::Mowing);
    assert_eq!(report.pending_command, Some(Command::Park));
    assert_eq!(
        report.snapshot.map(|s| s.status_code),
        Some("OK_CUTTING".to_owned())
    );
}
