// mowctl-api: Async Rust client for the robotic mower cloud (identity + tracking APIs)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::AuthToken;
pub use client::{AmcClient, Endpoints};
pub use error::Error;
pub use models::{LastLocation, MowerStatusPayload, MowerSummary};
pub use transport::TransportConfig;
