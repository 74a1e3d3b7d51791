use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the FEAT (Feature) FTP command (RFC 2389).
///
/// TLS features are advertised only when a certificate is loaded; UTF8 only
/// when enabled in the configuration.
pub async fn handle_feat_command(
    ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    let mut lines = vec![String::from("Features:")];
    if ctx.tls.is_some() {
        lines.push(String::from(" AUTH TLS"));
        lines.push(String::from(" PBSZ"));
        lines.push(String::from(" PROT"));
    }
    lines.push(String::from(" EPRT"));
    lines.push(String::from(" EPSV"));
    lines.push(String::from(" MDTM"));
    lines.push(String::from(" SIZE"));
    lines.push(String::from(" REST STREAM"));
    lines.push(String::from(" MLST type*;size*;modify*;"));
    lines.push(String::from(" MLSD"));
    if ctx.config.server.utf8 {
        lines.push(String::from(" UTF8"));
    }
    Ok(Reply::multi(211, lines, "End"))
}
