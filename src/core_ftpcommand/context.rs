use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core_auth::MembershipProvider;
use crate::core_proto::ReplyWriter;
use crate::core_tls::TlsContext;
use crate::core_vfs::Vfs;
use crate::session::Session;

/// Everything a command handler may touch, grouped per connection and shared
/// with transfer tasks. Built once on accept; the middleware chain re-enters
/// it for every command.
pub struct CommandContext {
    pub config: Arc<Config>,
    pub session: Arc<Mutex<Session>>,
    pub membership: Arc<dyn MembershipProvider>,
    pub vfs: Arc<dyn Vfs>,
    pub writer: Arc<ReplyWriter>,
    /// Present when the server has a certificate; used for AUTH TLS and
    /// PROT P data channels.
    pub tls: Option<TlsContext>,
    pub control_peer: SocketAddr,
    pub control_local: SocketAddr,
    /// Root token for this connection; transfers run on child tokens.
    pub cancel: CancellationToken,
    tls_upgrade_requested: AtomicBool,
    quit_requested: AtomicBool,
}

impl CommandContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        session: Arc<Mutex<Session>>,
        membership: Arc<dyn MembershipProvider>,
        vfs: Arc<dyn Vfs>,
        writer: Arc<ReplyWriter>,
        tls: Option<TlsContext>,
        control_peer: SocketAddr,
        control_local: SocketAddr,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            session,
            membership,
            vfs,
            writer,
            tls,
            control_peer,
            control_local,
            cancel,
            tls_upgrade_requested: AtomicBool::new(false),
            quit_requested: AtomicBool::new(false),
        }
    }

    /// Set by the AUTH handler; the connection loop performs the upgrade
    /// after flushing the 234 reply.
    pub fn request_tls_upgrade(&self) {
        self.tls_upgrade_requested.store(true, Ordering::SeqCst);
    }

    pub fn take_tls_upgrade_request(&self) -> bool {
        self.tls_upgrade_requested.swap(false, Ordering::SeqCst)
    }

    pub fn request_quit(&self) {
        self.quit_requested.store(true, Ordering::SeqCst);
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::SeqCst)
    }
}
