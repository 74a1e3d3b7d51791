use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

/// Handles the HELP FTP command.
pub async fn handle_help_command(
    _ctx: Arc<CommandContext>,
    _arg: String,
) -> Result<Reply, ServerError> {
    let lines = vec![
        String::from("The following commands are recognized:"),
        String::from(" USER PASS ACCT REIN QUIT NOOP SYST FEAT OPTS HELP STAT ALLO"),
        String::from(" CWD  CDUP PWD  MKD  RMD  DELE RNFR RNTO SIZE MDTM"),
        String::from(" TYPE STRU MODE PORT EPRT PASV EPSV REST ABOR"),
        String::from(" RETR STOR APPE STOU LIST NLST MLSD MLST"),
        String::from(" AUTH PBSZ PROT"),
    ];
    Ok(Reply::multi(214, lines, "Help OK."))
}
