// ── Command reconciliation ──
//
// Pure decision function: given the pending command and the latest
// normalized status, decide what the supervisor does this cycle.

use crate::model::{Command, MowerStatus};

/// Outcome of comparing a pending command with the observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The device already is where the command wants it. Clear the command.
    Satisfied,
    /// The device is in a transient state that would fight the command.
    /// Wait for the next cycle without sending anything.
    Blocked,
    /// Send this command to the device.
    Issue(Command),
    /// Status is `Error` or `Unknown`; hold the command and do nothing.
    Unsatisfiable,
}

/// Statuses in which `command` counts as done.
pub fn satisfied_by(command: Command) -> &'static [MowerStatus] {
    match command {
        Command::Start => &[MowerStatus::Mowing],
        Command::Stop => &[
            MowerStatus::Charging,
            MowerStatus::Parked,
            MowerStatus::Paused,
        ],
        Command::Park => &[
            MowerStatus::Charging,
            MowerStatus::Parked,
            MowerStatus::Searching,
        ],
    }
}

/// Statuses in which issuing `command` is held back.
pub fn blocked_by(command: Command) -> &'static [MowerStatus] {
    match command {
        Command::Start => &[MowerStatus::Searching, MowerStatus::Charging],
        Command::Stop | Command::Park => &[],
    }
}

/// Whether `status` satisfies `command`. Used by the facade wait as well.
pub fn is_satisfied(command: Command, status: MowerStatus) -> bool {
    satisfied_by(command).contains(&status)
}

/// Decide the action for `command` under `status`.
///
/// Satisfaction is always checked before anything is issued.
pub fn reconcile(command: Command, status: MowerStatus) -> Reconciliation {
    if !status.is_actionable() {
        return Reconciliation::Unsatisfiable;
    }
    if is_satisfied(command, status) {
        return Reconciliation::Satisfied;
    }
    if blocked_by(command).contains(&status) {
        return Reconciliation::Blocked;
    }
    Reconciliation::Issue(command)
}
