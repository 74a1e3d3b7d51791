// src/constants.rs

/// Longest control-channel line accepted before the parser answers 500.
pub const MAX_COMMAND_LINE: usize = 1024;

/// Capacity of each direction of a byte pipe.
pub const PIPE_CAPACITY: usize = 64 * 1024;

/// Buffer size used when streaming file bytes on the data channel.
pub const DATA_BUFFER_SIZE: usize = 64 * 1024;

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_PASV_ACCEPT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ACTIVE_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 15;

/// How long ABOR waits for the transfer task to wind down.
pub const ABOR_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_PASV_PORT_MIN: u16 = 49152;
pub const DEFAULT_PASV_PORT_MAX: u16 = 65534;

pub const DEFAULT_IMPLICIT_TLS_PORT: u16 = 990;
