// Domain value objects
pub mod category;
pub mod event_kind;
pub mod panel_kind;

pub use category::*;
pub use event_kind::*;
pub use panel_kind::*;
