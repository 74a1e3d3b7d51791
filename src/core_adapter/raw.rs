use async_trait::async_trait;
use log::{debug, trace};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::adapter::{Adapter, AdapterError};
use crate::core_pipe::{DuplexPipe, PipeRead};

/// Passthrough adapter between the TCP socket and the socket-side pipe.
///
/// The receiver task moves socket bytes into `pipe.input`; the transmitter
/// task moves `pipe.output` bytes onto the socket. The socket halves are
/// handed back when the tasks end, so stopping the adapter never closes the
/// connection: that happens when the owning connection drops the chain.
pub struct RawAdapter {
    read_half: Option<OwnedReadHalf>,
    write_half: Option<OwnedWriteHalf>,
    pipe: Arc<DuplexPipe>,
    token: CancellationToken,
    recv_task: Option<JoinHandle<OwnedReadHalf>>,
    send_task: Option<JoinHandle<OwnedWriteHalf>>,
    started: bool,
    detached: bool,
}

impl RawAdapter {
    pub fn new(socket: TcpStream) -> Self {
        let (read_half, write_half) = socket.into_split();
        Self {
            read_half: Some(read_half),
            write_half: Some(write_half),
            pipe: Arc::new(DuplexPipe::new()),
            token: CancellationToken::new(),
            recv_task: None,
            send_task: None,
            started: false,
            detached: false,
        }
    }
}

#[async_trait]
impl Adapter for RawAdapter {
    async fn start(&mut self) -> Result<(), AdapterError> {
        if self.started {
            return Ok(());
        }
        if self.detached {
            return Err(AdapterError::Detached);
        }
        let mut read_half = self.read_half.take().ok_or(AdapterError::Detached)?;
        let mut write_half = self.write_half.take().ok_or(AdapterError::Detached)?;

        let input = self.pipe.input.clone();
        let token = self.token.clone();
        self.recv_task = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; 8192];
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    read = read_half.read(&mut buf) => match read {
                        Ok(0) => {
                            trace!("Raw receiver reached EOF");
                            input.close();
                            break;
                        }
                        Ok(n) => {
                            if input.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("Raw receiver error: {}", e);
                            input.close();
                            break;
                        }
                    },
                }
            }
            read_half
        }));

        let output = self.pipe.output.clone();
        self.send_task = Some(tokio::spawn(async move {
            loop {
                match output.read_chunk().await {
                    PipeRead::Data(chunk) => {
                        if let Err(e) = write_half.write_all(&chunk).await {
                            debug!("Raw transmitter error: {}", e);
                            break;
                        }
                    }
                    PipeRead::Cancelled => continue,
                    PipeRead::Closed => {
                        let _ = write_half.flush().await;
                        break;
                    }
                }
            }
            write_half
        }));

        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AdapterError> {
        if !self.started {
            return Ok(());
        }
        // Drain in-flight writes before detaching.
        self.pipe.output.close();
        if let Some(task) = self.send_task.take() {
            if let Ok(write_half) = task.await {
                self.write_half = Some(write_half);
            }
        }
        self.token.cancel();
        if let Some(task) = self.recv_task.take() {
            if let Ok(read_half) = task.await {
                self.read_half = Some(read_half);
            }
        }
        self.started = false;
        self.detached = true;
        Ok(())
    }

    fn app_pipe(&self) -> Arc<DuplexPipe> {
        Arc::clone(&self.pipe)
    }

    fn name(&self) -> &'static str {
        "raw"
    }
}
