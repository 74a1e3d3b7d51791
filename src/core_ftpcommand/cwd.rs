use log::debug;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the CWD (Change Working Directory) FTP command.
///
/// The target is resolved against the session's working directory and must
/// exist as a directory. A resolution that would climb above the chroot
/// answers 550 and leaves the working directory unchanged.
pub async fn handle_cwd_command(
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
        Ok(md) if md.is_dir => {
            let mut session = ctx.session.lock().await;
            session.cwd = path.clone();
            debug!("Working directory is now {}", path);
            Ok(Reply::new(250, "Directory successfully changed."))
        }
        Ok(_) => Ok(Reply::new(550, "Not a directory.")),
        Err(e) => Ok(e.to_reply()),
    }
}
