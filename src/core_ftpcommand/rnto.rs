use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the RNTO (Rename To) FTP command. Without a pending RNFR the
/// sequence is broken and answers 503.
pub async fn handle_rnto_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().is_empty() {
        return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
    }

    let from = match ctx.session.lock().await.rename_from.take() {
        Some(from) => from,
        None => return Ok(Reply::new(503, "Bad sequence of commands.")),
    };

    let to = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    match ctx.vfs.rename(&from, &to).await {
        Ok(()) => {
            info!("Renamed {} -> {}", from, to);
            Ok(Reply::new(250, "Rename successful."))
        }
        Err(e) => Ok(e.to_reply()),
    }
}
