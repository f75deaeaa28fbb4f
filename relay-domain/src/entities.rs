// Domain entities

pub mod command;
pub mod events;
pub mod message;
pub mod panel;
pub mod player;
pub mod profile;
pub mod runtime_config;
pub mod server;

pub use command::*;
pub use events::*;
pub use message::*;
pub use panel::*;
pub use player::*;
pub use profile::*;
pub use runtime_config::*;
pub use server::*;
