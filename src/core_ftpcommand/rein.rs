use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the REIN FTP command: back to the unauthenticated state without
/// dropping the control channel.
pub async fn handle_rein_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    ctx.session.lock().await.reinitialize();
    Ok(Reply::new(220, "Service ready for new user."))
}
