use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the OPTS FTP command (RFC 2389). Only `UTF8 ON|OFF` is
/// recognised, and only when UTF-8 is enabled in the configuration.
pub async fn handle_opts_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let mut parts = arg.split_whitespace();
    let option = parts.next().map(|s| s.to_ascii_uppercase());
    let value = parts.next().map(|s| s.to_ascii_uppercase());

    match option.as_deref() {
        Some("UTF8") if ctx.config.server.utf8 => match value.as_deref() {
            Some("ON") => {
                ctx.session.lock().await.utf8_enabled = true;
                Ok(Reply::new(200, "UTF8 set to on."))
            }
            Some("OFF") => {
                ctx.session.lock().await.utf8_enabled = false;
                Ok(Reply::new(200, "UTF8 set to off."))
            }
            _ => Ok(Reply::new(501, "OPTS UTF8 takes ON or OFF.")),
        },
        _ => Ok(Reply::new(501, "Option not understood.")),
    }
}
