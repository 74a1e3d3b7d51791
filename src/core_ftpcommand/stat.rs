use std::sync::Arc;

use super::context::CommandContext;
use super::utils::{format_list_line, resolve_path};
use crate::core_proto::Reply;
use crate::core_vfs::DirEntry;
use crate::error::ServerError;
use crate::session::ProtLevel;

/// Handles the STAT FTP command.
///
/// Without an argument it reports session status over the control channel;
/// with one it lists the target inline, which works even while the data
/// channel is busy.
pub async fn handle_stat_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().is_empty() {
        return session_status(&ctx).await;
    }

    let path = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let md = match ctx.vfs.stat(&path).await {
        Ok(md) => md,
        Err(e) => return Ok(e.to_reply()),
    };

    let mut lines = vec![format!("Status of {}:", path)];
    if md.is_dir {
        match ctx.vfs.list(&path).await {
            Ok(entries) => {
                for entry in &entries {
                    lines.push(format_list_line(entry));
                }
            }
            Err(e) => return Ok(e.to_reply()),
        }
    } else {
        lines.push(format_list_line(&DirEntry {
            name: path.rsplit('/').next().unwrap_or(&path).to_string(),
            metadata: md,
        }));
    }
    Ok(Reply::multi(213, lines, "End of status."))
}

async fn session_status(ctx: &CommandContext) -> Result<Reply, ServerError> {
    let session = ctx.session.lock().await;
    let user = session
        .account()
        .map(|a| a.username.clone())
        .unwrap_or_else(|| String::from("(none)"));
    let lines = vec![
        String::from("Server status:"),
        format!("Logged in as {}", user),
        format!("TYPE: {}", session.transfer_type.as_char()),
        format!(
            "Protection: {}",
            match session.protection {
                ProtLevel::Clear => "Clear",
                ProtLevel::Private => "Private",
            }
        ),
        format!(
            "Control channel: {}",
            if session.tls_on_control {
                "TLS"
            } else {
                "cleartext"
            }
        ),
    ];
    Ok(Reply::multi(211, lines, "End of status."))
}
