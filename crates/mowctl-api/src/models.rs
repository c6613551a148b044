// Tracking API response models
//
// Only the fields the supervisor interprets are typed; everything else is
// kept in `extra` so JSON output can show the full vendor payload.

use serde::{Deserialize, Serialize};

/// One entry of `GET mowers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MowerSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// A GPS fix reported alongside the status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw body of `GET mowers/{id}/status`.
///
/// Timestamps are milliseconds since the Unix epoch, as sent by the cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MowerStatusPayload {
    pub mower_status: String,
    #[serde(default)]
    pub battery_percent: Option<u8>,
    #[serde(default)]
    pub stored_timestamp: Option<i64>,
    #[serde(default)]
    pub last_error_code: i64,
    #[serde(default)]
    pub last_error_code_timestamp: Option<i64>,
    #[serde(default)]
    pub last_locations: Vec<LastLocation>,
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
