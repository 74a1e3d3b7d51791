pub mod adapter;
pub mod raw;
pub mod tls;

pub use adapter::{Adapter, AdapterChain, AdapterError};
pub use raw::RawAdapter;
pub use tls::TlsAdapter;
