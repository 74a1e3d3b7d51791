use log::{debug, error, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::constants::DATA_BUFFER_SIZE;
use crate::core_ftpcommand::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::{ActiveTransfer, DataMode, ProtLevel, TransferType};

pub trait DataStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> DataStream for T {}

pub type BoxedDataStream = Box<dyn DataStream>;

/// Builds the data socket for one transfer according to the session's data
/// mode, then applies the session's protection level before any file byte
/// moves. The arrangement (listener or endpoint) is consumed either way.
pub async fn open_data_channel(ctx: &CommandContext) -> Result<BoxedDataStream, Reply> {
    let (mode, protection) = {
        let mut session = ctx.session.lock().await;
        (session.take_data_mode(), session.protection)
    };

    let connect_timeout = Duration::from_secs(ctx.config.pasv.connect_timeout_secs);
    let accept_timeout = Duration::from_secs(ctx.config.pasv.accept_timeout_secs);

    let socket = match mode {
        DataMode::None => return Err(Reply::new(425, "Use PORT or PASV first.")),
        DataMode::Active(addr) => match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(socket)) => socket,
            Ok(Err(e)) => {
                warn!("Active data connect to {} failed: {}", addr, e);
                return Err(Reply::new(425, "Can't open data connection."));
            }
            Err(_) => {
                warn!("Active data connect to {} timed out", addr);
                return Err(Reply::new(425, "Can't open data connection."));
            }
        },
        DataMode::Passive(listener) => match timeout(accept_timeout, listener.accept()).await {
            Ok(Ok((socket, peer))) => {
                if !ctx.config.pasv.promiscuous && peer.ip() != ctx.control_peer.ip() {
                    warn!(
                        "Rejecting data connection from {} (control peer is {})",
                        peer, ctx.control_peer
                    );
                    drop(socket);
                    return Err(Reply::new(425, "Can't open data connection."));
                }
                debug!("Accepted data connection from {}", peer);
                socket
            }
            Ok(Err(e)) => {
                warn!("Passive accept failed: {}", e);
                return Err(Reply::new(425, "Can't open data connection."));
            }
            // The listener is dropped here; the next PASV starts over.
            Err(_) => {
                warn!("Passive accept timed out");
                return Err(Reply::new(425, "Can't open data connection."));
            }
        },
    };

    match protection {
        ProtLevel::Clear => Ok(Box::new(socket)),
        ProtLevel::Private => {
            let tls = match ctx.tls.as_ref() {
                Some(tls) => tls,
                None => return Err(Reply::new(425, "Can't open data connection.")),
            };
            match tls.accept(socket).await {
                Ok(tls_stream) => Ok(Box::new(tls_stream)),
                Err(e) => {
                    warn!("Data-channel TLS handshake failed: {}", e);
                    Err(Reply::new(425, "Can't open data connection."))
                }
            }
        }
    }
}

/// Runs one transfer on its own task under a child cancellation token.
///
/// The task opens the data channel, runs `work`, and writes the completion
/// reply through the shared writer. Cancelling the token (ABOR or connection
/// teardown) drops the work future and with it the data stream; the replies
/// are then owned by whoever cancelled.
pub async fn spawn_transfer<F, Fut>(ctx: Arc<CommandContext>, work: F)
where
    F: FnOnce(BoxedDataStream) -> Fut + Send + 'static,
    Fut: Future<Output = Result<u64, ServerError>> + Send + 'static,
{
    let token = ctx.cancel.child_token();
    let completed = Arc::new(AtomicBool::new(false));
    // The task starts only after the ActiveTransfer handle is registered,
    // so a fast transfer cannot race its own bookkeeping.
    let (go_tx, go_rx) = oneshot::channel::<()>();

    let task_ctx = Arc::clone(&ctx);
    let task_token = token.clone();
    let task_completed = Arc::clone(&completed);
    let handle = tokio::spawn(async move {
        let _ = go_rx.await;

        let stream = match open_data_channel(&task_ctx).await {
            Ok(stream) => stream,
            Err(reply) => {
                task_completed.store(true, Ordering::SeqCst);
                task_ctx.session.lock().await.active_transfer = None;
                let _ = task_ctx.writer.send(&reply).await;
                return;
            }
        };

        let outcome = tokio::select! {
            _ = task_token.cancelled() => None,
            result = work(stream) => Some(result),
        };

        match outcome {
            // Aborted: the data stream is already closed (dropped with the
            // work future); 426/226 belong to the ABOR handler.
            None => {}
            Some(Ok(bytes)) => {
                task_completed.store(true, Ordering::SeqCst);
                task_ctx.session.lock().await.active_transfer = None;
                debug!("Transfer complete ({} bytes)", bytes);
                let _ = task_ctx
                    .writer
                    .send(&Reply::new(226, "Transfer complete."))
                    .await;
            }
            Some(Err(e)) => {
                task_completed.store(true, Ordering::SeqCst);
                task_ctx.session.lock().await.active_transfer = None;
                error!("Transfer failed: {}", e);
                let _ = task_ctx
                    .writer
                    .send(&Reply::new(426, "Connection closed; transfer aborted."))
                    .await;
            }
        }
    });

    ctx.session.lock().await.active_transfer = Some(ActiveTransfer {
        token,
        handle,
        completed,
    });
    let _ = go_tx.send(());
}

/// Streams `src` onto the data channel with the representation transform,
/// then shuts the channel down (FIN, or close-notify under PROT P).
pub async fn send_bytes<R>(
    mut stream: BoxedDataStream,
    mut src: R,
    transfer_type: TransferType,
) -> Result<u64, ServerError>
where
    R: AsyncRead + Send + Unpin,
{
    let written = match transfer_type {
        TransferType::Image => tokio::io::copy(&mut src, &mut stream)
            .await
            .map_err(|e| ServerError::Transfer(e.to_string()))?,
        TransferType::Ascii => send_ascii(&mut src, &mut stream)
            .await
            .map_err(|e| ServerError::Transfer(e.to_string()))?,
    };
    stream
        .shutdown()
        .await
        .map_err(|e| ServerError::Transfer(e.to_string()))?;
    Ok(written)
}

/// Drains the data channel into `dst` with the representation transform.
pub async fn receive_bytes<W>(
    mut stream: BoxedDataStream,
    mut dst: W,
    transfer_type: TransferType,
) -> Result<u64, ServerError>
where
    W: AsyncWrite + Send + Unpin,
{
    let written = match transfer_type {
        TransferType::Image => tokio::io::copy(&mut stream, &mut dst)
            .await
            .map_err(|e| ServerError::Transfer(e.to_string()))?,
        TransferType::Ascii => receive_ascii(&mut stream, &mut dst)
            .await
            .map_err(|e| ServerError::Transfer(e.to_string()))?,
    };
    dst.shutdown()
        .await
        .map_err(|e| ServerError::Transfer(e.to_string()))?;
    Ok(written)
}

/// ASCII representation outbound: bare LF becomes CRLF.
async fn send_ascii<R, W>(src: &mut R, dst: &mut W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DATA_BUFFER_SIZE];
    let mut out = Vec::with_capacity(DATA_BUFFER_SIZE + DATA_BUFFER_SIZE / 8);
    let mut written = 0u64;
    let mut prev = 0u8;
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.clear();
        for &b in &buf[..n] {
            if b == b'\n' && prev != b'\r' {
                out.push(b'\r');
            }
            out.push(b);
            prev = b;
        }
        dst.write_all(&out).await?;
        written += out.len() as u64;
    }
    Ok(written)
}

/// ASCII representation inbound: CRLF becomes the local LF. A CR not
/// followed by LF is kept as-is, including one dangling at EOF.
async fn receive_ascii<R, W>(src: &mut R, dst: &mut W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DATA_BUFFER_SIZE];
    let mut out = Vec::with_capacity(DATA_BUFFER_SIZE);
    let mut written = 0u64;
    let mut pending_cr = false;
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.clear();
        for &b in &buf[..n] {
            if pending_cr {
                pending_cr = false;
                if b == b'\n' {
                    out.push(b'\n');
                    continue;
                }
                out.push(b'\r');
            }
            if b == b'\r' {
                pending_cr = true;
            } else {
                out.push(b);
            }
        }
        dst.write_all(&out).await?;
        written += out.len() as u64;
    }
    if pending_cr {
        dst.write_all(b"\r").await?;
        written += 1;
    }
    Ok(written)
}
