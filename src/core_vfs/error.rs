use thiserror::Error;

use crate::core_proto::Reply;

/// Categorised virtual-filesystem failures. Handlers map each category to
/// one FTP reply; the raw cause never crosses the module boundary.
#[derive(Error, Debug)]
pub enum VfsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("already exists: {0}")]
    Exists(String),

    #[error("resource busy: {0}")]
    Busy(String),

    #[error("filesystem error: {0}")]
    Other(String),
}

impl VfsError {
    pub fn from_io(path: &str, e: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => VfsError::NotFound(path.to_string()),
            ErrorKind::PermissionDenied => VfsError::Permission(path.to_string()),
            ErrorKind::AlreadyExists => VfsError::Exists(path.to_string()),
            _ => VfsError::Other(format!("{}: {}", path, e)),
        }
    }

    pub fn to_reply(&self) -> Reply {
        match self {
            VfsError::NotFound(_) => Reply::new(550, "File or directory not found."),
            VfsError::Permission(_) => Reply::new(550, "Permission denied."),
            VfsError::Exists(_) => Reply::new(553, "File already exists."),
            VfsError::Busy(_) => Reply::new(450, "File busy; try again later."),
            VfsError::Other(_) => {
                Reply::new(451, "Requested action aborted. Local error in processing.")
            }
        }
    }
}
