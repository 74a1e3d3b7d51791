pub mod error;
pub mod os;
pub mod path;
pub mod vfs;

pub use error::VfsError;
pub use os::OsVfs;
pub use path::resolve_virtual;
pub use vfs::{DirEntry, Metadata, OpenMode, Vfs};
