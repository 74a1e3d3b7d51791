use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::AuthState;

/// Handles the ACCT FTP command. Completes a login the provider left in
/// `AccountNeeded`; superfluous otherwise.
pub async fn handle_acct_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().is_empty() {
        return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
    }

    let mut session = ctx.session.lock().await;
    match std::mem::replace(&mut session.auth, AuthState::Unauthenticated) {
        AuthState::AccountNeeded(account) => {
            session.cwd = account.home_dir.clone();
            info!("User {} logged in with account", account.username);
            session.auth = AuthState::Authenticated(account);
            Ok(Reply::new(230, "User logged in, proceed."))
        }
        other => {
            session.auth = other;
            Ok(Reply::new(202, "ACCT not needed for this server."))
        }
    }
}
