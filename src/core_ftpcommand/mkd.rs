use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the MKD (Make Directory) FTP command.
pub async fn handle_mkd_command(
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

    match ctx.vfs.mkdir(&path).await {
        Ok(()) => {
            info!("Created directory {}", path);
            Ok(Reply::new(
                257,
                format!("\"{}\" created.", path.replace('"', "\"\"")),
            ))
        }
        Err(e) => Ok(e.to_reply()),
    }
}
