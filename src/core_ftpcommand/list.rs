use log::info;
use std::io::Cursor;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::{format_list_line, resolve_path};
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::core_vfs::DirEntry;
use crate::error::ServerError;
use crate::session::TransferType;

/// Handles the LIST FTP command.
///
/// The listing is rendered up front (so VFS errors answer before 150) and
/// streamed over the data channel with CRLF line endings already in place.
pub async fn handle_list_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let target = strip_list_flags(&arg);
    let path = match resolve_path(&ctx, target).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let listing = match render_listing(&ctx, &path).await {
        Ok(listing) => listing,
        Err(reply) => return Ok(reply),
    };

    ctx.writer
        .send(&Reply::new(150, "Here comes the directory listing."))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Listing {}", path);

    // Lines already carry CRLF; send them untransformed.
    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::send_bytes(stream, Cursor::new(listing.into_bytes()), TransferType::Image)
    })
    .await;

    Ok(Reply::none())
}

/// `LIST -la` style flags are accepted and ignored.
pub(super) fn strip_list_flags(arg: &str) -> &str {
    arg.split_whitespace()
        .find(|part| !part.starts_with('-'))
        .unwrap_or("")
}

async fn render_listing(ctx: &CommandContext, path: &str) -> Result<String, Reply> {
    let md = ctx.vfs.stat(path).await.map_err(|e| e.to_reply())?;
    let mut out = String::new();
    if md.is_dir {
        let entries = ctx.vfs.list(path).await.map_err(|e| e.to_reply())?;
        for entry in &entries {
            out.push_str(&format_list_line(entry));
            out.push_str("\r\n");
        }
    } else {
        let entry = DirEntry {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            metadata: md,
        };
        out.push_str(&format_list_line(&entry));
        out.push_str("\r\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_stripped() {
        assert_eq!(strip_list_flags("-la"), "");
        assert_eq!(strip_list_flags("-la sub"), "sub");
        assert_eq!(strip_list_flags("sub"), "sub");
        assert_eq!(strip_list_flags(""), "");
    }
}
