use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

use super::context::CommandContext;
use super::utils::resolve_path;
use crate::core_network::data;
use crate::core_proto::Reply;
use crate::core_vfs::{OpenMode, VfsError};
use crate::error::ServerError;

/// Handles the STOU (Store Unique) FTP command.
///
/// Derives a unique name from the argument (or `ftp` when absent) with a
/// random suffix, created exclusively so two sessions can never collide.
/// The chosen name is reported in the 150 reply, FILE: form.
pub async fn handle_stou_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let stem = if arg.trim().is_empty() {
        "ftp"
    } else {
        arg.trim()
    };
    let base = match resolve_path(&ctx, stem).await {
        Ok(path) => path,
        Err(reply) => return Ok(reply),
    };

    let transfer_type = ctx.session.lock().await.transfer_type;

    let mut opened = None;
    for _ in 0..8 {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        let candidate = format!("{}.{}", base, suffix);
        match ctx
            .vfs
            .open_write(&candidate, 0, OpenMode::Exclusive)
            .await
        {
            Ok(file) => {
                opened = Some((candidate, file));
                break;
            }
            Err(VfsError::Exists(_)) => continue,
            Err(e) => return Ok(e.to_reply()),
        }
    }

    let (path, file) = match opened {
        Some(pair) => pair,
        None => return Ok(Reply::new(451, "Could not create a unique file.")),
    };

    let name = path.rsplit('/').next().unwrap_or(&path).to_string();
    ctx.writer
        .send(&Reply::new(150, format!("FILE: {}", name)))
        .await
        .map_err(ServerError::Fatal)?;
    info!("Receiving unique file {}", path);

    data::spawn_transfer(Arc::clone(&ctx), move |stream| {
        data::receive_bytes(stream, file, transfer_type)
    })
    .await;

    Ok(Reply::none())
}
