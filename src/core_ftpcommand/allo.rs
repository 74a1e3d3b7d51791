use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the ALLO FTP command. Allocation is a no-op on this server.
pub async fn handle_allo_command(
    _ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    Ok(Reply::new(202, "ALLO command ignored."))
}
