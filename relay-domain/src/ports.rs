// Repository and Service Port Traits (Interfaces)
// Define what the relay needs from infrastructure

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
