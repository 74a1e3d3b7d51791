use async_trait::async_trait;
use log::{debug, trace};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::adapter::{Adapter, AdapterError};
use crate::core_pipe::{DuplexPipe, PipeRead, PipeStream};
use crate::core_tls::TlsContext;

/// TLS layer spliced between the socket-side pipe and a cleartext app-side
/// pipe.
///
/// `start` wraps the socket pipe as a stream and runs the server handshake
/// on it, so for a hot upgrade the control reader must already have been
/// paused via cancel-pending-read: any byte it had consumed past the `234`
/// would be lost to the handshake. The receiver service moves decrypted
/// bytes into the app pipe, the transmitter encrypts app-pipe output.
pub struct TlsAdapter {
    lower: Arc<DuplexPipe>,
    upper: Arc<DuplexPipe>,
    tls: TlsContext,
    token: CancellationToken,
    recv_task: Option<JoinHandle<()>>,
    send_task: Option<JoinHandle<()>>,
    started: bool,
    detached: bool,
}

impl TlsAdapter {
    pub fn new(lower: Arc<DuplexPipe>, tls: TlsContext) -> Self {
        Self {
            lower,
            upper: Arc::new(DuplexPipe::new()),
            tls,
            token: CancellationToken::new(),
            recv_task: None,
            send_task: None,
            started: false,
            detached: false,
        }
    }
}

#[async_trait]
impl Adapter for TlsAdapter {
    async fn start(&mut self) -> Result<(), AdapterError> {
        if self.started {
            return Ok(());
        }
        if self.detached {
            return Err(AdapterError::Detached);
        }

        let stream = PipeStream::upper(&self.lower);
        let tls_stream = self.tls.accept(stream).await?;
        trace!("TLS handshake complete on control channel");
        let (mut tls_read, mut tls_write) = tokio::io::split(tls_stream);

        let input = self.upper.input.clone();
        let token = self.token.clone();
        self.recv_task = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; 8192];
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    read = tls_read.read(&mut buf) => match read {
                        Ok(0) => {
                            input.close();
                            break;
                        }
                        Ok(n) => {
                            if input.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("TLS receiver error: {}", e);
                            input.close();
                            break;
                        }
                    },
                }
            }
        }));

        let output = self.upper.output.clone();
        self.send_task = Some(tokio::spawn(async move {
            loop {
                match output.read_chunk().await {
                    PipeRead::Data(chunk) => {
                        if let Err(e) = tls_write.write_all(&chunk).await {
                            debug!("TLS transmitter error: {}", e);
                            break;
                        }
                    }
                    PipeRead::Cancelled => continue,
                    PipeRead::Closed => {
                        // Flush the close-notify alert before detaching.
                        let _ = tls_write.shutdown().await;
                        break;
                    }
                }
            }
        }));

        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AdapterError> {
        if !self.started {
            return Ok(());
        }
        self.upper.output.close();
        if let Some(task) = self.send_task.take() {
            let _ = task.await;
        }
        self.token.cancel();
        if let Some(task) = self.recv_task.take() {
            let _ = task.await;
        }
        self.started = false;
        self.detached = true;
        Ok(())
    }

    fn app_pipe(&self) -> Arc<DuplexPipe> {
        Arc::clone(&self.upper)
    }

    fn name(&self) -> &'static str {
        "tls"
    }
}
