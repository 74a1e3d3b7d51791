use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the QUIT FTP command. The goodbye is flushed before the
/// connection loop tears the channel down.
pub async fn handle_quit_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    ctx.request_quit();
    Ok(Reply::new(221, "Goodbye."))
}
