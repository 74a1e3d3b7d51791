use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the MODE FTP command. Only Stream mode is supported.
pub async fn handle_mode_command(
    _ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    match arg.trim().to_ascii_uppercase().as_str() {
        "S" => Ok(Reply::new(200, "Mode set to Stream.")),
        "B" | "C" => Ok(Reply::new(504, "Command not implemented for that parameter.")),
        _ => Ok(Reply::new(501, "Syntax error in parameters or arguments.")),
    }
}
