//! lift-telemetry-bridge - Elevator telemetry poller
//!
//! Polls an elevator telemetry API with a self-renewing bearer token,
//! normalizes each equipment into a `Device` with typed endpoints, and hands
//! one randomly refreshed device per tick to a registered observer.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod snapshot;
pub mod upstream;

pub use auth::TokenCache;
pub use error::{BridgeError, Result};
pub use models::{Device, Endpoint, EndpointDataType, EndpointType, EndpointValue};
pub use poller::{PollerState, PollingScheduler};
pub use snapshot::{RefreshOutcome, SnapshotBuilder};
pub use upstream::{ApiClient, Fetcher};
