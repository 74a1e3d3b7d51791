use log::{debug, warn};
use rand::Rng;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core_ftpcommand::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::DataMode;

/// Handles the PASV (Passive Mode) FTP command.
///
/// Allocates a listener within the configured passive port range, parks it
/// in the session for the next transfer command, and advertises the
/// endpoint in the `(h1,h2,h3,h4,p1,p2)` form.
pub async fn handle_pasv_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    let advertised = advertised_ip(&ctx);
    let IpAddr::V4(v4) = advertised else {
        return Ok(Reply::new(425, "Passive mode requires IPv4; use EPSV."));
    };

    let listener = match bind_in_range(&ctx).await {
        Some(listener) => listener,
        None => return Ok(Reply::new(425, "Can't open data connection.")),
    };
    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(_) => return Ok(Reply::new(425, "Can't open data connection.")),
    };

    ctx.session.lock().await.data_mode = DataMode::Passive(listener);

    let octets = v4.octets();
    debug!("PASV listener on {}:{}", advertised, port);
    Ok(Reply::new(
        227,
        format!(
            "Entering Passive Mode ({},{},{},{},{},{}).",
            octets[0],
            octets[1],
            octets[2],
            octets[3],
            port / 256,
            port % 256
        ),
    ))
}

/// Handles the EPSV (Extended Passive Mode) FTP command (RFC 2428).
pub async fn handle_epsv_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    if arg.trim().eq_ignore_ascii_case("ALL") {
        return Ok(Reply::new(200, "EPSV ALL accepted."));
    }

    let listener = match bind_in_range(&ctx).await {
        Some(listener) => listener,
        None => return Ok(Reply::new(425, "Can't open data connection.")),
    };
    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(_) => return Ok(Reply::new(425, "Can't open data connection.")),
    };

    ctx.session.lock().await.data_mode = DataMode::Passive(listener);

    debug!("EPSV listener on port {}", port);
    Ok(Reply::new(
        229,
        format!("Entering Extended Passive Mode (|||{}|)", port),
    ))
}

/// Tries each port of the configured range once, starting from a random
/// offset so parallel sessions spread out.
async fn bind_in_range(ctx: &CommandContext) -> Option<TcpListener> {
    let min = ctx.config.pasv.port_min;
    let max = ctx.config.pasv.port_max;
    let span = (max - min) as u32 + 1;
    let start = rand::thread_rng().gen_range(0..span);
    let bind_ip = ctx.control_local.ip();

    for i in 0..span {
        let port = min + ((start + i) % span) as u16;
        match TcpListener::bind(SocketAddr::new(bind_ip, port)).await {
            Ok(listener) => return Some(listener),
            Err(_) => continue,
        }
    }
    warn!("No free port in passive range {}-{}", min, max);
    None
}

/// The address advertised in 227 replies: the configured public address if
/// it parses, else the address the control connection arrived on.
fn advertised_ip(ctx: &CommandContext) -> IpAddr {
    ctx.config
        .pasv
        .pasv_address
        .parse()
        .unwrap_or_else(|_| ctx.control_local.ip())
}
