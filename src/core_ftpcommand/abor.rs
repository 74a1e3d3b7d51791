use log::info;
use std::sync::Arc;
use std::time::Duration;

use super::context::CommandContext;
use crate::constants::ABOR_TIMEOUT_SECS;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the ABOR FTP command.
///
/// Cancels the transfer-scoped token and waits for the transfer task to
/// wind down, which closes the data channel. Only then go 426 and 226 out,
/// in that order. With nothing to abort a bare 226 suffices.
pub async fn handle_abor_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    let transfer = ctx.session.lock().await.active_transfer.take();

    match transfer {
        Some(transfer) => {
            info!("Aborting active transfer");
            transfer.token.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(ABOR_TIMEOUT_SECS), transfer.handle)
                .await;
            // The transfer may have finished (and replied) just as the
            // abort arrived; then there is nothing to report as aborted.
            if transfer.completed.load(std::sync::atomic::Ordering::SeqCst) {
                return Ok(Reply::new(226, "No transfer to abort."));
            }
            ctx.writer
                .send(&Reply::new(426, "Connection closed; transfer aborted."))
                .await
                .map_err(ServerError::Fatal)?;
            Ok(Reply::new(226, "Abort successful."))
        }
        None => Ok(Reply::new(226, "No transfer to abort.")),
    }
}
