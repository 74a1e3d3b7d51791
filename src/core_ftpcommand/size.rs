use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the SIZE FTP command (RFC 3659). Directories have no size.
pub async fn handle_size_command(
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

    match ctx.vfs.stat(&path).await {
        Ok(md) if md.is_dir => Ok(Reply::new(550, "Not a regular file.")),
        Ok(md) => Ok(Reply::new(213, md.size.to_string())),
        Err(e) => Ok(e.to_reply()),
    }
}
