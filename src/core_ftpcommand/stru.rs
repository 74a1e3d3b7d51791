use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the STRU FTP command. Only File structure survives in practice.
pub async fn handle_stru_command(
    _ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    match arg.trim().to_ascii_uppercase().as_str() {
        "F" => Ok(Reply::new(200, "Structure set to File.")),
        "R" | "P" => Ok(Reply::new(504, "Command not implemented for that parameter.")),
        _ => Ok(Reply::new(501, "Syntax error in parameters or arguments.")),
    }
}
