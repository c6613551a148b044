//! Supervisory control layer between `mowctl-api` and its consumers (CLI / admin server).
//!
//! - **[`Controller`]**: synchronous-looking facade over the background
//!   loop. [`Controller::spawn`] starts a [`Supervisor`] and returns a cheap,
//!   cloneable handle; callers submit a [`Command`] and wait (bounded) until
//!   the mower's reported state satisfies it.
//!
//! - **[`Supervisor`]**: the poll loop. Authenticates, fetches status on an
//!   interval, normalizes vendor codes into [`MowerStatus`], and reconciles
//!   the pending command by (re)issuing control calls.
//!
//! - **[`reconcile`]**: the pure decision table: satisfied, blocked,
//!   issue, or unsatisfiable.
//!
//! - **[`DeviceApi`]**: the seam to the cloud. [`CloudDevice`] implements it
//!   on top of `mowctl_api::AmcClient`; tests substitute scripted fakes.

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod model;
pub mod reconcile;
mod state;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, SupervisorConfig};
pub use controller::Controller;
pub use device::{CloudDevice, DeviceApi, TokenSink};
pub use error::CoreError;
pub use model::{Command, DeviceSnapshot, LastError, MowerStatus, Position, StatusReport};
pub use reconcile::{Reconciliation, reconcile};
pub use supervisor::{Cycle, Supervisor};

pub use mowctl_api::{
    AmcClient, AuthToken, Endpoints, Error as ApiError, MowerSummary, TransportConfig,
};
