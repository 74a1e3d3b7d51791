use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the RMD (Remove Directory) FTP command.
pub async fn handle_rmd_command(
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

    match ctx.vfs.rmdir(&path).await {
        Ok(()) => {
            info!("Removed directory {}", path);
            Ok(Reply::new(250, "Directory removed."))
        }
        Err(e) => Ok(e.to_reply()),
    }
}
