use log::debug;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the RNFR (Rename From) FTP command.
///
/// The source must exist; the pending path survives only until the next
/// command, and only RNTO consumes it.
pub async fn handle_rnfr_command(
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

    if let Err(e) = ctx.vfs.stat(&path).await {
        return Ok(e.to_reply());
    }

    debug!("Rename pending from {}", path);
    ctx.session.lock().await.rename_from = Some(path);
    Ok(Reply::new(350, "Ready for RNTO."))
}
