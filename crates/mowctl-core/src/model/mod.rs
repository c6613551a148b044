// ── Domain model ──
//
// Canonical types shared by the supervisor, the facade and the CLI.

pub mod command;
pub mod snapshot;
pub mod status;

pub use command::Command;
pub use snapshot::{DeviceSnapshot, LastError, Position, StatusReport};
pub use status::{MowerStatus, STATUS_TABLE, lookup, normalize};
