// ── Normalized mower status ──
//
// Vendor status codes are free-form strings; everything downstream works
// on the seven-value `MowerStatus`. The mapping is a plain data table so new
// device families only need new rows.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Device state as seen by the supervisor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MowerStatus {
    Parked,
    Charging,
    Mowing,
    Searching,
    Paused,
    Error,
    Unknown,
}

/// Vendor status code → normalized status.
pub const STATUS_TABLE: &[(&str, MowerStatus)] = &[
    ("PAUSED", MowerStatus::Paused),
    ("OK_CUTTING", MowerStatus::Mowing),
    ("OK_LEAVING", MowerStatus::Mowing),
    ("OK_CUTTING_NOT_AUTO", MowerStatus::Mowing),
    ("OK_SEARCHING", MowerStatus::Searching),
    ("OK_CHARGING", MowerStatus::Charging),
    ("PARKED_TIMER", MowerStatus::Parked),
    ("PARKED_AUTOTIMER", MowerStatus::Parked),
    ("PARKED_PARKED_SELECTED", MowerStatus::Parked),
    ("PARKED_DAILY_LIMIT", MowerStatus::Parked),
    ("ERROR", MowerStatus::Error),
    ("ERROR_AT_POWER_UP", MowerStatus::Error),
];

/// Look a vendor code up in [`STATUS_TABLE`]. Matching is exact.
pub fn lookup(code: &str) -> Option<MowerStatus> {
    STATUS_TABLE
        .iter()
        .find(|(vendor, _)| *vendor == code)
        .map(|(_, status)| *status)
}

/// Normalize a vendor code, falling back to [`MowerStatus::Unknown`].
pub fn normalize(code: &str) -> MowerStatus {
    lookup(code).unwrap_or(MowerStatus::Unknown)
}

impl MowerStatus {
    /// `Error` and `Unknown` leave the reconciler with nothing safe to do.
    pub fn is_actionable(self) -> bool {
        !matches!(self, Self::Error | Self::Unknown)
    }
}
