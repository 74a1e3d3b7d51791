use crate::core_pipe::DuplexPipe;
use crate::core_tls::TlsError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("adapter was stopped and cannot be restarted")]
    Detached,

    /// Cleartext bytes were pipelined past the TLS upgrade boundary, so
    /// the handshake was never started.
    #[error("cleartext input crossed the TLS upgrade boundary")]
    UpgradeAborted,

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("adapter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A duplex transformer between the socket and the parser.
///
/// Bytes flow through the chain in order outbound and in reverse inbound.
/// `start` is idempotent until `stop`; `stop` drains in-flight writes and
/// detaches. An adapter never closes the underlying socket: the owning
/// connection does that by dropping the chain.
#[async_trait]
pub trait Adapter: Send {
    async fn start(&mut self) -> Result<(), AdapterError>;
    async fn stop(&mut self) -> Result<(), AdapterError>;

    /// The boundary pipe the next layer up reads from and writes to.
    fn app_pipe(&self) -> Arc<DuplexPipe>;

    fn name(&self) -> &'static str;
}

/// Ordered adapter stack for one connection. Today the stack is raw
/// passthrough (length 1) or raw + TLS (length 2 after an upgrade).
pub struct AdapterChain {
    adapters: Vec<Box<dyn Adapter>>,
}

impl AdapterChain {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Starts the adapter and pushes it on top of the stack.
    pub async fn push(&mut self, mut adapter: Box<dyn Adapter>) -> Result<(), AdapterError> {
        adapter.start().await?;
        self.adapters.push(adapter);
        Ok(())
    }

    /// The pipe the parser and response writer operate on.
    pub fn top_pipe(&self) -> Option<Arc<DuplexPipe>> {
        self.adapters.last().map(|a| a.app_pipe())
    }

    pub fn depth(&self) -> usize {
        self.adapters.len()
    }

    /// Stops adapters top-down, draining each one's writes.
    pub async fn stop(&mut self) {
        while let Some(mut adapter) = self.adapters.pop() {
            if let Err(e) = adapter.stop().await {
                log::debug!("Error stopping {} adapter: {}", adapter.name(), e);
            }
        }
    }
}

impl Default for AdapterChain {
    fn default() -> Self {
        Self::new()
    }
}
