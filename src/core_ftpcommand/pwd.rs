use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the PWD (Print Working Directory) FTP command. Embedded quotes
/// are doubled per RFC 959.
pub async fn handle_pwd_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    let cwd = ctx.session.lock().await.cwd.clone();
    Ok(Reply::new(
        257,
        format!("\"{}\" is the current directory.", cwd.replace('"', "\"\"")),
    ))
}
