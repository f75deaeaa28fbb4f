pub mod discord_client;
pub mod gateway_client;
pub mod relay_service;
pub mod retention_service;
pub mod steam_profiles;

pub use discord_client::*;
pub use gateway_client::*;
pub use relay_service::*;
pub use retention_service::*;
pub use steam_profiles::*;
