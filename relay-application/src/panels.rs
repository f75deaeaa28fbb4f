// Status and bounty panels: pure rendering plus the reconciliation engine

pub mod engine;
pub mod render;

pub use engine::{PanelPhase, PanelReconciler, TickOutcome};
