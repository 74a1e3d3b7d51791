use log::info;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is opened at the pending REST offset before 150 goes out, so
/// VFS errors answer cleanly without touching the data channel. The
/// streaming itself runs on a transfer task; its completion reply arrives
/// asynchronously through the shared writer.
pub async fn handle_retr_command(
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

    // REST is consumed now, whatever happens to the transfer.
    let (offset, transfer_type) = {
        let mut session = ctx.session.lock().await;
        (session.take_restart_offset(), session.transfer_type)
    };

    let file = match ctx.vfs.open_read(&path, offset).await {
        Ok(file) => file,
        Err(e) => return Ok(e.to_reply()),
    };

    ctx.writer
        .send(&Reply::new(150, "Opening data connection."))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Sending {} (offset {})", path, offset);

    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::send_bytes(stream, file, transfer_type)
    })
    .await;

    Ok(Reply::none())
}
