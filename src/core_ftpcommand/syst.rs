use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the SYST FTP command.
pub async fn handle_syst_command(
    _ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    Ok(Reply::new(215, "UNIX Type: L8"))
}
