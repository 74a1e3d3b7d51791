use log::debug;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::AuthState;

/// Handles the USER FTP command.
///
/// Records the user name and moves the session to `UserGiven`. A USER while
/// already logged in starts the login over, as RFC 959 allows.
pub async fn handle_user_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let username = arg.trim();
    if username.is_empty() {
        return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
    }

    let mut session = ctx.session.lock().await;
    session.auth = AuthState::UserGiven(username.to_string());
    debug!("USER {} awaiting password", username);
    Ok(Reply::new(
        331,
        format!("User {} okay, need password.", username),
    ))
}
