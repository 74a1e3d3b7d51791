use log::{info, warn};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::core_ftpcommand::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::DataMode;

/// Handles the PORT (Active Mode) FTP command.
///
/// Parses the `h1,h2,h3,h4,p1,p2` endpoint and records it; the connection
/// itself is dialed when the next transfer command runs.
pub async fn handle_port_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let addr = match parse_port_argument(&arg) {
        Some(addr) => addr,
        None => {
            return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
        }
    };

    if !ctx.config.pasv.promiscuous && addr.ip() != ctx.control_peer.ip() {
        warn!(
            "Rejecting PORT to {} from control peer {}",
            addr, ctx.control_peer
        );
        return Ok(Reply::new(500, "Illegal PORT command."));
    }

    info!("Active mode endpoint set to {}", addr);
    ctx.session.lock().await.data_mode = DataMode::Active(addr);
    Ok(Reply::new(200, "PORT command successful."))
}

/// Handles the EPRT FTP command (RFC 2428): `|1|ip|port|` or `|2|ip6|port|`.
pub async fn handle_eprt_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let addr = match parse_eprt_argument(&arg) {
        Some(addr) => addr,
        None => {
            return Ok(Reply::new(501, "Syntax error in parameters or arguments."));
        }
    };

    if !ctx.config.pasv.promiscuous && addr.ip() != ctx.control_peer.ip() {
        warn!(
            "Rejecting EPRT to {} from control peer {}",
            addr, ctx.control_peer
        );
        return Ok(Reply::new(500, "Illegal EPRT command."));
    }

    info!("Active mode endpoint set to {}", addr);
    ctx.session.lock().await.data_mode = DataMode::Active(addr);
    Ok(Reply::new(200, "EPRT command successful."))
}

fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let numbers: Result<Vec<u8>, _> = parts.iter().map(|p| p.trim().parse::<u8>()).collect();
    let numbers = numbers.ok()?;
    let ip = IpAddr::from([numbers[0], numbers[1], numbers[2], numbers[3]]);
    let port = (numbers[4] as u16) << 8 | numbers[5] as u16;
    if port == 0 {
        return None;
    }
    Some(SocketAddr::new(ip, port))
}

fn parse_eprt_argument(arg: &str) -> Option<SocketAddr> {
    let arg = arg.trim();
    let delim = arg.chars().next()?;
    let mut fields = arg.split(delim);
    fields.next()?; // leading empty field
    let proto = fields.next()?;
    let host = fields.next()?;
    let port = fields.next()?.parse::<u16>().ok()?;
    if port == 0 {
        return None;
    }
    let ip: IpAddr = host.parse().ok()?;
    match (proto, ip) {
        ("1", IpAddr::V4(_)) | ("2", IpAddr::V6(_)) => Some(SocketAddr::new(ip, port)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_port_argument() {
        let addr = parse_port_argument("127,0,0,1,7,208").unwrap();
        assert_eq!(addr, "127.0.0.1:2000".parse().unwrap());
        assert!(parse_port_argument("1,2,3").is_none());
        assert!(parse_port_argument("256,0,0,1,7,208").is_none());
        assert!(parse_port_argument("127,0,0,1,0,0").is_none());
    }

    #[test]
    fn parses_eprt_argument() {
        let addr = parse_eprt_argument("|1|132.235.1.2|6275|").unwrap();
        assert_eq!(addr, "132.235.1.2:6275".parse().unwrap());
        let addr = parse_eprt_argument("|2|::1|6275|").unwrap();
        assert_eq!(addr, "[::1]:6275".parse().unwrap());
        // Protocol/family mismatch.
        assert!(parse_eprt_argument("|2|132.235.1.2|6275|").is_none());
        assert!(parse_eprt_argument("garbage").is_none());
    }
}
