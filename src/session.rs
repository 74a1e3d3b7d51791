use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core_auth::UserAccount;

/// Login progress for one control connection. Transitions are monotonic
/// within a session except REIN, which resets to `Unauthenticated` without
/// closing the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    UserGiven(String),
    /// Credentials verified but the provider wants an ACCT to finish.
    AccountNeeded(UserAccount),
    Authenticated(UserAccount),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Image,
}

impl TransferType {
    pub fn as_char(&self) -> char {
        match self {
            TransferType::Ascii => 'A',
            TransferType::Image => 'I',
        }
    }
}

/// Negotiated data-channel protection (RFC 2228): Clear or Private (TLS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtLevel {
    Clear,
    Private,
}

/// How the next data connection is established.
pub enum DataMode {
    None,
    /// Client endpoint from PORT/EPRT; we dial out.
    Active(SocketAddr),
    /// Listener allocated by PASV/EPSV; we accept in.
    Passive(TcpListener),
}

/// Handle on the transfer task currently owning the data channel.
pub struct ActiveTransfer {
    pub token: CancellationToken,
    pub handle: JoinHandle<()>,
    /// Set by the task once it has produced its own completion reply, so an
    /// ABOR racing the natural end of a transfer does not report 426.
    pub completed: Arc<AtomicBool>,
}

/// Authoritative per-connection state, mutated only by command handlers on
/// the control task. Transfer tasks reach it through the shared mutex.
pub struct Session {
    pub auth: AuthState,
    /// Virtual working directory, always absolute within the chroot.
    pub cwd: String,
    pub transfer_type: TransferType,
    pub protection: ProtLevel,
    pub pbsz_done: bool,
    pub data_mode: DataMode,
    /// Byte offset for the next RETR/STOR/APPE, then cleared.
    pub restart_offset: Option<u64>,
    /// RNFR argument awaiting its RNTO.
    pub rename_from: Option<String>,
    pub active_transfer: Option<ActiveTransfer>,
    pub tls_on_control: bool,
    pub utf8_enabled: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            cwd: String::from("/"),
            transfer_type: TransferType::Ascii,
            protection: ProtLevel::Clear,
            pbsz_done: false,
            data_mode: DataMode::None,
            restart_offset: None,
            rename_from: None,
            active_transfer: None,
            tls_on_control: false,
            utf8_enabled: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    pub fn account(&self) -> Option<&UserAccount> {
        match &self.auth {
            AuthState::Authenticated(account) => Some(account),
            _ => None,
        }
    }

    /// REIN: back to square one, control channel stays up. The TLS state of
    /// the control channel is unaffected.
    pub fn reinitialize(&mut self) {
        self.auth = AuthState::Unauthenticated;
        self.cwd = String::from("/");
        self.transfer_type = TransferType::Ascii;
        self.protection = ProtLevel::Clear;
        self.pbsz_done = false;
        self.data_mode = DataMode::None;
        self.restart_offset = None;
        self.rename_from = None;
    }

    /// The REST offset applies to the next transfer command only.
    pub fn take_restart_offset(&mut self) -> u64 {
        self.restart_offset.take().unwrap_or(0)
    }

    /// Each PORT/EPRT/PASV/EPSV arrangement serves exactly one transfer.
    pub fn take_data_mode(&mut self) -> DataMode {
        std::mem::replace(&mut self.data_mode, DataMode::None)
    }

    pub fn transfer_in_progress(&self) -> bool {
        self.active_transfer.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_offset_is_consumed_once() {
        let mut session = Session::new();
        session.restart_offset = Some(1024);
        assert_eq!(session.take_restart_offset(), 1024);
        assert_eq!(session.take_restart_offset(), 0);
    }

    #[test]
    fn reinitialize_resets_auth_but_not_control_tls() {
        let mut session = Session::new();
        session.auth = AuthState::UserGiven("alice".to_string());
        session.tls_on_control = true;
        session.cwd = String::from("/sub");
        session.reinitialize();
        assert_eq!(session.auth, AuthState::Unauthenticated);
        assert_eq!(session.cwd, "/");
        assert!(session.tls_on_control);
    }
}
