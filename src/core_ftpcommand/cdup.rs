use std::sync::Arc;

use super::context::CommandContext;
use super::cwd::handle_cwd_command;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the CDUP (Change to Parent Directory) FTP command. CDUP at the
/// chroot root is an escape attempt and fails like CWD would.
pub async fn handle_cdup_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    handle_cwd_command(ctx, String::from("..")).await
}
