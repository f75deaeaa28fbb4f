pub mod context;
pub mod lifecycle;

pub use lifecycle::{run_announce, run_gateway, run_relay};
