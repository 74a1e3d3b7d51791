use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the PBSZ FTP command (RFC 2228). TLS has no protection buffer,
/// so the only acceptable size is 0, and only once the control channel is
/// secured.
pub async fn handle_pbsz_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if !ctx.session.lock().await.tls_on_control {
        return Ok(Reply::new(503, "Secure the control channel first (AUTH TLS)."));
    }

    if arg.trim() != "0" {
        return Ok(Reply::new(501, "PBSZ must be 0 for TLS."));
    }

    ctx.session.lock().await.pbsz_done = true;
    Ok(Reply::new(200, "PBSZ=0"))
}
