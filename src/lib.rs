pub mod config;
pub mod constants;
pub mod core_adapter;
pub mod core_auth;
pub mod core_cli;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_pipe;
pub mod core_proto;
pub mod core_tls;
pub mod core_vfs;
pub mod error;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::ServerError;
