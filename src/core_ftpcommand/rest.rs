use log::debug;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the REST FTP command (RFC 3659 STREAM mode restart).
///
/// The offset applies to the next RETR/STOR/APPE only; those handlers
/// consume it whatever the transfer's outcome.
pub async fn handle_rest_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let offset: u64 = match arg.trim().parse() {
        Ok(offset) => offset,
        Err(_) => return Ok(Reply::new(501, "Syntax error in parameters or arguments.")),
    };

    ctx.session.lock().await.restart_offset = Some(offset);
    debug!("Restart offset set to {}", offset);
    Ok(Reply::new(
        350,
        format!("Restarting at {}. Send STORE or RETRIEVE.", offset),
    ))
}
