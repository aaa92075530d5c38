//! Device polling
//!
//! - `scheduler`: initial population plus the randomized refresh timer

pub mod scheduler;

pub use scheduler::{OnDataFn, PollerState, PollingScheduler};
