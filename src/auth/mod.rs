//! Upstream authorization
//!
//! - `token`: client-credentials token cache

pub mod token;

pub use token::{Clock, SystemClock, Token, TokenCache};
