use async_trait::async_trait;
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::VfsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create or truncate (STOR).
    Create,
    /// Create or append (APPE).
    Append,
    /// Create, failing if the file exists (STOU).
    Exclusive,
}

#[derive(Debug, Clone)]
pub struct Metadata {
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Unix permission bits when the backend has them.
    pub mode: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub metadata: Metadata,
}

pub type ReadStream = Box<dyn AsyncRead + Send + Unpin>;
pub type WriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// The virtual-filesystem collaborator. Paths are virtual (absolute within
/// the session chroot, `/`-separated); implementations own the mapping to
/// real storage and may not let a path escape their root.
#[async_trait]
pub trait Vfs: Send + Sync {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, VfsError>;

    async fn stat(&self, path: &str) -> Result<Metadata, VfsError>;

    async fn open_read(&self, path: &str, offset: u64) -> Result<ReadStream, VfsError>;

    async fn open_write(
        &self,
        path: &str,
        offset: u64,
        mode: OpenMode,
    ) -> Result<WriteStream, VfsError>;

    async fn delete(&self, path: &str) -> Result<(), VfsError>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), VfsError>;

    async fn mkdir(&self, path: &str) -> Result<(), VfsError>;

    async fn rmdir(&self, path: &str) -> Result<(), VfsError>;
}
