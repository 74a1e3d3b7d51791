use crate::core_tls::TlsError;
use crate::core_vfs::VfsError;
use thiserror::Error;

/// Errors surfaced by command handlers and the connection runtime.
///
/// Every variant has exactly one propagation rule: protocol, auth, VFS and
/// transfer errors are answered on the control channel and the connection
/// continues; fatal errors tear the connection down without a reply.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("data transfer failed: {0}")]
    Transfer(String),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("membership provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Control-channel I/O failure or invariant violation. The connection is
    /// torn down without attempting a reply.
    #[error("fatal connection error: {0}")]
    Fatal(#[source] std::io::Error),
}

impl ServerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Fatal(_))
    }
}
