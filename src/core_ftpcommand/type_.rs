use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;
use crate::session::TransferType;

/// Handles the TYPE FTP command.
///
/// Only ASCII (`A`, optionally `A N`) and Image (`I`) representations are
/// supported; EBCDIC and Local byte answer 504.
pub async fn handle_type_command(
    ctx: Arc<CommandContext>,
    arg: String,
) -> Result<Reply, ServerError> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    let primary = parts.first().map(|s| s.to_ascii_uppercase());

    let new_type = match primary.as_deref() {
        Some("A") => {
            // Only the non-print form subtype is supported.
            match parts.get(1).map(|s| s.to_ascii_uppercase()).as_deref() {
                None | Some("N") => TransferType::Ascii,
                Some(_) => {
                    return Ok(Reply::new(504, "Command not implemented for that parameter."))
                }
            }
        }
        Some("I") => TransferType::Image,
        Some("E") | Some("L") => {
            return Ok(Reply::new(504, "Command not implemented for that parameter."))
        }
        _ => return Ok(Reply::new(501, "Syntax error in parameters or arguments.")),
    };

    let mut session = ctx.session.lock().await;
    session.transfer_type = new_type;
    Ok(Reply::new(
        200,
        format!("Type set to {}.", new_type.as_char()),
    ))
}
