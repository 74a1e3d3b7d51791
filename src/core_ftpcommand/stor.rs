use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::core_vfs::OpenMode;
use crate::error::ServerError;

/// Handles the STOR (Store File) FTP command.
///
/// A pending REST offset turns the store into an overwrite-at-offset
/// without truncation; otherwise the file is created or truncated.
pub async fn handle_stor_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().is_empty() {
        return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
    }

    let path = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let (offset, transfer_type) = {
        let mut session = ctx.session.lock().await;
        (session.take_restart_offset(), session.transfer_type)
    };

    let file = match ctx.vfs.open_write(&path, offset, OpenMode::Create).await {
        Ok(file) => file,
        Err(e) => return Ok(e.to_reply()),
    };

    ctx.writer
        .send(&Reply::new(
            150,
            "File status okay; about to open data connection.",
        ))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Receiving {} (offset {})", path, offset);

    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::receive_bytes(stream, file, transfer_type)
    })
    .await;

    Ok(Reply::none())
}
