use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the NOOP FTP command.
pub async fn handle_noop_command(
    _ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    Ok(Reply::new(200, "NOOP ok."))
}
