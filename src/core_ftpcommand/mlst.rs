use std::sync::Arc;

use super::context::CommandContext;
use super::utils::{format_mlsx_facts, resolve_path};
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the MLST FTP command (RFC 3659): facts for one path, on the
/// control channel, no data connection involved.
pub async fn handle_mlst_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let path = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let md = match ctx.vfs.stat(&path).await {
        Ok(md) => md,
        Err(e) => return Ok(e.to_reply()),
    };

    let lines = vec![
        format!("Listing {}", path),
        format!(" {} {}", format_mlsx_facts(&md), path),
    ];
    Ok(Reply::multi(250, lines, "End"))
}
