use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the DELE (Delete File) FTP command.
pub async fn handle_dele_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().is_empty() {
        return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
    }

    let path = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    match ctx.vfs.delete(&path).await {
        Ok(()) => {
            info!("Deleted {}", path);
            Ok(Reply::new(250, "File deleted."))
        }
        Err(e) => Ok(e.to_reply()),
    }
}
