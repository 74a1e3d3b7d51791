use log::info;
use std::io::Cursor;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::{format_mlsx_facts, resolve_path};
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::TransferType;

/// Handles the MLSD FTP command (RFC 3659): machine-readable listing of a
/// directory over the data channel.
pub async fn handle_mlsd_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let path = match resolve_path(&ctx, &arg).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    match ctx.vfs.stat(&path).await {
        Ok(md) if !md.is_dir => {
            return Ok(Reply::new(501, "MLSD requires a directory; use MLST."))
        }
        Err(e) => return Ok(e.to_reply()),
        Ok(_) => {}
    }

    let entries = match ctx.vfs.list(&path).await {
        Ok(entries) => entries,
        Err(e) => return Ok(e.to_reply()),
    };
    let mut listing = String::new();
    for entry in &entries {
        listing.push_str(&format_mlsx_facts(&entry.metadata));
        listing.push(' ');
        listing.push_str(&entry.name);
        listing.push_str("\r\n");
    }

    ctx.writer
        .send(&Reply::new(150, "Here comes the directory listing."))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Machine-listing {}", path);

    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::send_bytes(stream, Cursor::new(listing.into_bytes()), TransferType::Image)
    })
    .await;

    Ok(Reply::none())
}
