// ── Per-poll device snapshot ──

use chrono::{DateTime, Utc};
use mowctl_api::MowerStatusPayload;
use serde::Serialize;

use super::{Command, MowerStatus};

/// Last known GPS position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// The device's most recent fault, if it reported one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
    pub code: i64,
    pub at: Option<DateTime<Utc>>,
}

/// What one status poll told us about the device.
///
/// Produced by [`DeviceApi::fetch_status`](crate::DeviceApi::fetch_status)
/// and consumed by the supervisor within the same cycle. The latest one is
/// kept in the shared state for read-only rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    /// Raw vendor status code, e.g. `OK_CUTTING`.
    pub status_code: String,
    pub battery_percent: Option<u8>,
    pub position: Option<Position>,
    /// `None` when the device reports error code 0.
    pub last_error: Option<LastError>,
    /// Device-side timestamp of the status.
    pub reported_at: Option<DateTime<Utc>>,
    /// When this process received it.
    pub observed_at: DateTime<Utc>,
}

impl DeviceSnapshot {
    /// A snapshot carrying only a status code.
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            status_code: code.into(),
            battery_percent: None,
            position: None,
            last_error: None,
            reported_at: None,
            observed_at: Utc::now(),
        }
    }
}

impl From<MowerStatusPayload> for DeviceSnapshot {
    fn from(payload: MowerStatusPayload) -> Self {
        let last_error = (payload.last_error_code != 0).then(|| LastError {
            code: payload.last_error_code,
            at: payload
                .last_error_code_timestamp
                .and_then(DateTime::from_timestamp_millis),
        });

        Self {
            status_code: payload.mower_status,
            battery_percent: payload.battery_percent,
            position: payload.last_locations.first().map(|loc| Position {
                latitude: loc.latitude,
                longitude: loc.longitude,
            }),
            last_error,
            reported_at: payload
                .stored_timestamp
                .and_then(DateTime::from_timestamp_millis),
            observed_at: Utc::now(),
        }
    }
}

/// Serializable view served by `status --output json` and the admin `/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: MowerStatus,
    pub pending_command: Option<Command>,
    pub snapshot: Option<DeviceSnapshot>,
}
