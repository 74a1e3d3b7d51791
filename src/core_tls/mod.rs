pub mod error;
pub mod tls_connection;

pub use error::TlsError;
pub use tls_connection::TlsContext;
