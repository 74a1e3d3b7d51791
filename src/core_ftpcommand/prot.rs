use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::ProtLevel;

/// Handles the PROT FTP command (RFC 4217).
///
/// Accepts Clear and Private; Safe and Confidential are not offered. The
/// level applies to data channels opened from now on, never to one already
/// in flight.
pub async fn handle_prot_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let mut session = ctx.session.lock().await;
    if !session.pbsz_done {
        return Ok(Reply::new(503, "PBSZ must precede PROT."));
    }

    match arg.trim().to_ascii_uppercase().as_str() {
        "C" => {
            session.protection = ProtLevel::Clear;
            info!("Data protection level set to Clear");
            Ok(Reply::new(200, "Protection level set to Clear."))
        }
        "P" => {
            if ctx.tls.is_none() {
                return Ok(Reply::new(536, "Protection level not supported."));
            }
            session.protection = ProtLevel::Private;
            info!("Data protection level set to Private");
            Ok(Reply::new(200, "Protection level set to Private."))
        }
        _ => Ok(Reply::new(536, "Protection level not supported.")),
    }
}
