use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::constants::MAX_COMMAND_LINE;
use crate::core_adapter::{AdapterChain, AdapterError, RawAdapter, TlsAdapter};
use crate::core_auth::MembershipProvider;
use crate::core_ftpcommand::context::CommandContext;
use crate::core_ftpcommand::handlers::CommandRegistry;
use crate::core_ftpcommand::middleware::{
    AuthGateMiddleware, Endpoint, LoggingMiddleware, Middleware, Next, TransferGateMiddleware,
};
use crate::core_proto::{ReadOutcome, Reply, ReplyWriter, Request, RequestReader};
use crate::core_tls::TlsContext;
use crate::core_vfs::Vfs;
use crate::error::ServerError;
use crate::session::Session;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The per-connection runtime: adapter chain, parser, dispatcher and
/// teardown for one control connection.
pub struct Connection {
    config: Arc<Config>,
    registry: Arc<CommandRegistry>,
    membership: Arc<dyn MembershipProvider>,
    vfs: Arc<dyn Vfs>,
    tls: Option<TlsContext>,
    /// Negotiate TLS immediately on accept (implicit FTPS listener).
    implicit_tls: bool,
}

impl Connection {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<CommandRegistry>,
        membership: Arc<dyn MembershipProvider>,
        vfs: Arc<dyn Vfs>,
        tls: Option<TlsContext>,
        implicit_tls: bool,
    ) -> Self {
        Self {
            config,
            registry,
            membership,
            vfs,
            tls,
            implicit_tls,
        }
    }

    /// Drives the connection until QUIT, disconnect, error or shutdown.
    /// Dropping the adapter chain at the end is what closes the socket.
    pub async fn run(self, socket: TcpStream, shutdown: CancellationToken) {
        let peer = match socket.peer_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Could not read peer address: {}", e);
                return;
            }
        };
        let local = match socket.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Could not read local address: {}", e);
                return;
            }
        };
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        info!("New control connection #{} from {}", id, peer);

        let mut chain = AdapterChain::new();
        if let Err(e) = chain.push(Box::new(RawAdapter::new(socket))).await {
            error!("Could not start raw adapter: {}", e);
            return;
        }
        let Some(raw_pipe) = chain.top_pipe() else {
            return;
        };

        let mut tls_on_control = false;
        if self.implicit_tls {
            let tls = match self.tls.clone() {
                Some(tls) => tls,
                None => {
                    error!("Implicit FTPS listener without TLS context");
                    chain.stop().await;
                    return;
                }
            };
            // Implicit FTPS: handshake failure is fatal, no reply is owed.
            if let Err(e) = chain
                .push(Box::new(TlsAdapter::new(Arc::clone(&raw_pipe), tls)))
                .await
            {
                warn!("Implicit TLS handshake with {} failed: {}", peer, e);
                chain.stop().await;
                return;
            }
            tls_on_control = true;
        }

        let Some(top) = chain.top_pipe() else {
            chain.stop().await;
            return;
        };
        let writer = Arc::new(ReplyWriter::new(Arc::clone(&top)));
        let mut reader = RequestReader::new(top, MAX_COMMAND_LINE);

        let cancel = shutdown.child_token();
        let session = Arc::new(Mutex::new(Session::new()));
        session.lock().await.tls_on_control = tls_on_control;

        let ctx = Arc::new(CommandContext::new(
            Arc::clone(&self.config),
            Arc::clone(&session),
            Arc::clone(&self.membership),
            Arc::clone(&self.vfs),
            Arc::clone(&writer),
            self.tls.clone(),
            peer,
            local,
            cancel.clone(),
        ));

        let middlewares: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(LoggingMiddleware) as Arc<dyn Middleware>,
            Arc::new(AuthGateMiddleware) as Arc<dyn Middleware>,
            Arc::new(TransferGateMiddleware) as Arc<dyn Middleware>,
        ]);
        let registry = Arc::clone(&self.registry);
        let endpoint: Endpoint = Arc::new(move |ctx, req: Request| {
            let registry = Arc::clone(&registry);
            Box::pin(async move {
                match registry.get(&req.verb) {
                    Some(handler) => handler(ctx, req.arg).await,
                    None => Ok(Reply::new(500, "Syntax error, command unrecognized.")),
                }
            })
        });

        if writer.send(&self.greeting()).await.is_err() {
            self.teardown(&cancel, &session, &mut chain).await;
            return;
        }

        let idle_timeout = Duration::from_secs(self.config.server.idle_timeout_secs);

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Connection {} cancelled by shutdown", peer);
                    break;
                }
                outcome = tokio::time::timeout(idle_timeout, reader.next()) => outcome,
            };

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(_) => {
                    // The control channel is quiet during transfers; only an
                    // idle session is dropped.
                    if session.lock().await.transfer_in_progress() {
                        continue;
                    }
                    info!("Closing idle connection from {}", peer);
                    let _ = writer.send(&Reply::new(421, "Timeout.")).await;
                    break;
                }
            };

            let request = match outcome {
                ReadOutcome::Request(request) => request,
                ReadOutcome::Oversize => {
                    if writer
                        .send(&Reply::new(500, "Command line too long."))
                        .await
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }
                ReadOutcome::Cancelled => continue,
                ReadOutcome::Eof => {
                    debug!("Peer {} closed the control connection", peer);
                    break;
                }
            };

            let verb = request.verb.clone();

            // A pending rename survives exactly one command: its RNTO.
            if verb != "RNTO" {
                session.lock().await.rename_from = None;
            }

            let next = Next::chain(Arc::clone(&middlewares), Arc::clone(&endpoint));
            let result = next.run(Arc::clone(&ctx), request).await;

            let reply = match result {
                Ok(reply) => reply,
                Err(ServerError::ProviderUnavailable(e)) => {
                    error!("Provider unavailable: {}", e);
                    let _ = writer
                        .send(&Reply::new(421, "Service not available, closing control connection."))
                        .await;
                    break;
                }
                Err(ServerError::Fatal(e)) => {
                    error!("Fatal connection error: {}", e);
                    break;
                }
                Err(e) => {
                    warn!("Command {} failed: {}", verb, e);
                    Reply::new(451, "Requested action aborted. Local error in processing.")
                }
            };

            if writer.send(&reply).await.is_err() {
                break;
            }

            if ctx.take_tls_upgrade_request() {
                match self
                    .upgrade_to_tls(&mut chain, &mut reader, &writer, &raw_pipe)
                    .await
                {
                    Ok(()) => {
                        session.lock().await.tls_on_control = true;
                        info!("Control connection with {} upgraded to TLS", peer);
                    }
                    Err(e) => {
                        // Explicit upgrade failure keeps the cleartext
                        // channel usable; the client may try again.
                        warn!("TLS upgrade with {} failed: {}", peer, e);
                        if writer
                            .send(&Reply::new(
                                431,
                                "Need some unavailable resource to process security.",
                            ))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }

            if ctx.quit_requested() {
                debug!("QUIT from {}", peer);
                break;
            }
        }

        self.teardown(&cancel, &session, &mut chain).await;
        info!("Connection #{} with {} closed", id, peer);
    }

    /// The AUTH TLS hot upgrade: the 234 is already flushed. Pause the
    /// control reader via cancel-pending-read so every byte still in the
    /// socket pipe is left for the handshake, splice the TLS adapter in,
    /// then resume parsing on the cleartext side.
    ///
    /// The pause must drain clean: a command pipelined together with the
    /// AUTH TLS arrived in cleartext, so the handshake must not consume the
    /// bytes behind it. Such a command is answered here (one reply per
    /// request) and the upgrade aborts; the caller reports 431 and the
    /// cleartext channel stays usable for a retry.
    async fn upgrade_to_tls(
        &self,
        chain: &mut AdapterChain,
        reader: &mut RequestReader,
        writer: &ReplyWriter,
        raw_pipe: &Arc<crate::core_pipe::DuplexPipe>,
    ) -> Result<(), AdapterError> {
        let tls = self
            .tls
            .clone()
            .ok_or(AdapterError::Tls(crate::core_tls::TlsError::TlsNotConfigured))?;

        raw_pipe.input.cancel_pending_read();
        match reader.next().await {
            ReadOutcome::Cancelled => {}
            ReadOutcome::Request(req) => {
                // The parser never reached the pipe, so the sentinel is
                // still pending and would poison the next reader.
                raw_pipe.input.clear_cancel_pending();
                debug!(
                    "Aborting TLS upgrade: {} was pipelined across the boundary",
                    req.verb
                );
                let _ = writer
                    .send(&Reply::new(503, "Bad sequence of commands."))
                    .await;
                return Err(AdapterError::UpgradeAborted);
            }
            ReadOutcome::Oversize => {
                raw_pipe.input.clear_cancel_pending();
                let _ = writer
                    .send(&Reply::new(500, "Command line too long."))
                    .await;
                return Err(AdapterError::UpgradeAborted);
            }
            ReadOutcome::Eof => {
                raw_pipe.input.clear_cancel_pending();
                return Err(AdapterError::UpgradeAborted);
            }
        }
        // A partial line is cleartext past the boundary all the same.
        if reader.buffered() > 0 {
            debug!("Aborting TLS upgrade: partial cleartext line buffered");
            return Err(AdapterError::UpgradeAborted);
        }

        chain
            .push(Box::new(TlsAdapter::new(Arc::clone(raw_pipe), tls)))
            .await?;

        if let Some(top) = chain.top_pipe() {
            reader.swap_pipe(Arc::clone(&top));
            writer.swap_pipe(top).await;
        }
        Ok(())
    }

    fn greeting(&self) -> Reply {
        if let Some(path) = &self.config.server.banner_file {
            match std::fs::read_to_string(path) {
                Ok(banner) => {
                    let lines: Vec<String> = banner.lines().map(|l| l.to_string()).collect();
                    if !lines.is_empty() {
                        return Reply::multi(220, lines, "ferroftpd ready.");
                    }
                }
                Err(e) => warn!("Could not read banner file {}: {}", path, e),
            }
        }
        Reply::new(220, "ferroftpd FTP server ready.")
    }

    /// Cancels everything hanging off this connection, waits for an active
    /// transfer to notice, and drains the adapter chain. Dropping the chain
    /// afterwards closes the socket.
    async fn teardown(
        &self,
        cancel: &CancellationToken,
        session: &Arc<Mutex<Session>>,
        chain: &mut AdapterChain,
    ) {
        cancel.cancel();
        let transfer = session.lock().await.active_transfer.take();
        if let Some(transfer) = transfer {
            let _ = tokio::time::timeout(Duration::from_secs(5), transfer.handle).await;
        }
        chain.stop().await;
    }
}
