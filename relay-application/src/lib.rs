// Relay Application Layer

pub mod commands;
pub mod error;
pub mod feeds;
pub mod metrics;
pub mod ops;
pub mod panels;
pub mod queries;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AppError;
pub use metrics::Metrics;
pub use state::{AppState, RelayState};
