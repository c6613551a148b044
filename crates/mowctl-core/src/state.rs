// ── Shared supervisor state ──

use std::time::Duration;

use crate::config::MIN_POLL_INTERVAL;
use crate::model::{Command, DeviceSnapshot, MowerStatus};

/// The record shared between the supervisor loop and facade callers.
///
/// Only the loop writes `status`/`snapshot` and clears `command`; callers set
/// `command`, `poll_interval` and `stop`. Everything sits behind one lock.
#[derive(Debug)]
pub(crate) struct SupervisorState {
    pub status: Option<MowerStatus>,
    pub snapshot: Option<DeviceSnapshot>,
    pub command: Option<Command>,
    pub poll_interval: Duration,
    pub stop: bool,
}

impl SupervisorState {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            status: None,
            snapshot: None,
            command: None,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            stop: false,
        }
    }
}
