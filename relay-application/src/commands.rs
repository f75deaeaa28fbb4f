pub mod ingest_commands;
pub mod queue_commands;
pub mod retention_commands;
