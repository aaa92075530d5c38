//! Upstream telemetry API access
//!
//! - `client`: bearer-authenticated JSON client and the `Fetcher` seam

pub mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::{build_http_client, ApiClient, Fetcher};
