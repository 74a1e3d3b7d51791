use std::sync::Arc;

use super::context::CommandContext;
use super::utils::{format_time_val, resolve_path};
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the MDTM FTP command (RFC 3659): last modification time as
/// `YYYYMMDDHHMMSS` in UTC.
pub async fn handle_mdtm_command(
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
        Ok(md) => Ok(Reply::new(213, format_time_val(md.modified))),
        Err(e) => Ok(e.to_reply()),
    }
}
