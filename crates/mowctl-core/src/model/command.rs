// ── User-issued commands ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A command the mower should end up satisfying.
///
/// The string form (`START`, `STOP`, `PARK`) is also the cloud control action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Command {
    Start,
    Stop,
    Park,
}

impl Command {
    /// The action string sent to the control endpoint.
    pub fn as_action(self) -> &'static str {
        self.into()
    }
}
