use log::info;
use std::io::Cursor;
use std::sync::Arc;

use super::context::CommandContext;
use super::list::strip_list_flags;
use super::utils::resolve_path;
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::TransferType;

/// Handles the NLST (Name List) FTP command: bare names, one per line.
pub async fn handle_nlst_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let target = strip_list_flags(&arg);
    let path = match resolve_path(&ctx, target).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let entries = match ctx.vfs.list(&path).await {
        Ok(entries) => entries,
        Err(e) => return Ok(e.to_reply()),
    };
    let mut listing = String::new();
    for entry in &entries {
        listing.push_str(&entry.name);
        listing.push_str("\r\n");
    }

    ctx.writer
        .send(&Reply::new(150, "Here comes the directory listing."))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Name-listing {}", path);

    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::send_bytes(stream, Cursor::new(listing.into_bytes()), TransferType::Image)
    })
    .await;

    Ok(Reply::none())
}
