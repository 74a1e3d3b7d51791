use anyhow::{Context, Result};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core_auth::{AnonymousProvider, MembershipProvider, PasswdFileProvider};
use crate::core_ftpcommand::handlers::CommandRegistry;
use crate::core_network::Connection;
use crate::core_tls::TlsContext;
use crate::core_vfs::{OsVfs, Vfs};

/// Runs the FTP server with the provided configuration until shutdown.
///
/// Binds the cleartext control listener and, when implicit FTPS is enabled,
/// a second listener that negotiates TLS on accept. Each accepted socket
/// gets its own connection runtime; Ctrl-C cancels the root token, which
/// propagates into every connection and transfer.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<()> {
    let config = Arc::new(config);

    let tls = if config.tls.enabled {
        Some(
            TlsContext::from_settings(&config.tls)
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to load the TLS certificate")?,
        )
    } else {
        None
    };

    let membership: Arc<dyn MembershipProvider> = match config.auth.provider.as_str() {
        "passwd" => Arc::new(
            PasswdFileProvider::load(&config.auth.passwd_file)
                .with_context(|| format!("Failed to load passwd file {}", config.auth.passwd_file))?,
        ),
        "anonymous" => Arc::new(AnonymousProvider),
        other => anyhow::bail!("Unknown auth provider: {}", other),
    };

    let vfs: Arc<dyn Vfs> = Arc::new(OsVfs::new(&config.vfs.root_dir));
    let registry = Arc::new(CommandRegistry::with_builtins());

    let bind_addr = format!(
        "{}:{}",
        config.server.listen_address, config.server.listen_port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    let implicit_listener = if config.tls.implicit {
        let addr = format!(
            "{}:{}",
            config.server.listen_address, config.tls.implicit_port
        );
        let l = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind implicit FTPS listener {}", addr))?;
        info!("Implicit FTPS listening on {}", addr);
        Some(l)
    } else {
        None
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, closing listeners");
                break;
            }
            accepted = listener.accept() => {
                spawn_connection(accepted, false, &config, &registry, &membership, &vfs, &tls, &shutdown);
            }
            accepted = accept_implicit(&implicit_listener) => {
                spawn_connection(accepted, true, &config, &registry, &membership, &vfs, &tls, &shutdown);
            }
        }
    }

    Ok(())
}

/// Pends forever when no implicit listener is configured, so the select
/// simply never takes this branch.
async fn accept_implicit(
    listener: &Option<TcpListener>,
) -> std::io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_connection(
    accepted: std::io::Result<(TcpStream, SocketAddr)>,
    implicit_tls: bool,
    config: &Arc<Config>,
    registry: &Arc<CommandRegistry>,
    membership: &Arc<dyn MembershipProvider>,
    vfs: &Arc<dyn Vfs>,
    tls: &Option<TlsContext>,
    shutdown: &CancellationToken,
) {
    let (socket, peer) = match accepted {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Accept failed: {}", e);
            return;
        }
    };

    let connection = Connection::new(
        Arc::clone(config),
        Arc::clone(registry),
        Arc::clone(membership),
        Arc::clone(vfs),
        tls.clone(),
        implicit_tls,
    );
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        connection.run(socket, shutdown).await;
        log::debug!("Connection task for {} finished", peer);
    });
}

/// Convenience used by the binary: runs until Ctrl-C.
pub async fn run_until_ctrl_c(config: Config) -> Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not install Ctrl-C handler: {}", e);
            return;
        }
        info!("Ctrl-C received");
        signal_token.cancel();
    });
    run(config, shutdown).await
}
