use tracing::info;

use crate::{AppError, AppState};
use relay_domain::GameCommand;

/// Queues an operator command for the game agent, returning the queue length.
pub async fn queue_command(state: &AppState, command: GameCommand) -> Result<usize, AppError> {
    if command.is_blank() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    let length = state.command_queue.enqueue(command).await;
    state.metrics.record_command_queued();
    info!(queue_length = length, "command queued");
    Ok(length)
}

/// Hands every queued command to the caller and clears the queue.
///
/// Commands are gone once returned; a caller that crashes before acting on
/// them loses them.
pub async fn drain_commands(state: &AppState) -> Vec<GameCommand> {
    let commands = state.command_queue.drain_all().await;
    if !commands.is_empty() {
        state.metrics.record_commands_drained(commands.len());
        info!(count = commands.len(), "commands drained");
    }
    commands
}
