use log::{info, warn};
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_auth::AuthVerdict;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::AuthState;

/// Handles the PASS FTP command.
///
/// Hands the USER/PASS pair to the membership provider and completes or
/// rejects the login. The provider is expected to make a miss cost the same
/// as a hit, so this handler stays timing-neutral.
pub async fn handle_pass_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let username = {
        let session = ctx.session.lock().await;
        match &session.auth {
            AuthState::UserGiven(name) => name.clone(),
            AuthState::Authenticated(_) => {
                return Ok(Reply::new(230, "Already logged in."));
            }
            _ => return Ok(Reply::new(503, "Login with USER first.")),
        }
    };

    // The session lock is not held across the provider call.
    let verdict = ctx
        .membership
        .authenticate(&username, &arg)
        .await
        .map_err(|e| ServerError::ProviderUnavailable(e.to_string()))?;

    let mut session = ctx.session.lock().await;
    match verdict {
        AuthVerdict::Success(account) => {
            if ctx.membership.requires_account(&account) {
                session.auth = AuthState::AccountNeeded(account);
                return Ok(Reply::new(332, "Need account for login."));
            }
            session.cwd = account.home_dir.clone();
            info!("User {} logged in", account.username);
            session.auth = AuthState::Authenticated(account);
            Ok(Reply::new(230, "User logged in, proceed."))
        }
        AuthVerdict::NeedsAccount(account) => {
            session.auth = AuthState::AccountNeeded(account);
            Ok(Reply::new(332, "Need account for login."))
        }
        AuthVerdict::Denied => {
            warn!("Failed login for user {}", username);
            session.auth = AuthState::Unauthenticated;
            Ok(Reply::new(530, "Login incorrect."))
        }
    }
}
