use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the AUTH FTP command (RFC 2228 / RFC 4217).
///
/// Only the TLS mechanism is offered. The handler answers 234 and flags the
/// upgrade; the connection loop performs it after the reply is flushed,
/// pausing the control reader so no byte past the 234 is consumed in
/// cleartext.
pub async fn handle_auth_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let mechanism = arg.trim().to_ascii_uppercase();
    if mechanism != "TLS" && mechanism != "TLS-C" {
        return Ok(Reply::new(504, "Mechanism not supported."));
    }

    if ctx.tls.is_none() {
        return Ok(Reply::new(534, "TLS not available on this server."));
    }

    if ctx.session.lock().await.tls_on_control {
        return Ok(Reply::new(503, "Already using TLS."));
    }

    info!("Client requested TLS upgrade");
    ctx.request_tls_upgrade();
    Ok(Reply::new(234, "AUTH TLS successful."))
}
