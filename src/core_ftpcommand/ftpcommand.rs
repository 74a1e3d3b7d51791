#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    ACCT,
    REIN,
    QUIT,
    CWD,
    CDUP,
    PWD,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    STAT,
    TYPE,
    STRU,
    MODE,
    PORT,
    EPRT,
    PASV,
    EPSV,
    RETR,
    STOR,
    APPE,
    STOU,
    LIST,
    NLST,
    MLSD,
    MLST,
    REST,
    ABOR,
    AUTH,
    PBSZ,
    PROT,
    FEAT,
    OPTS,
    HELP,
    NOOP,
    SYST,
    ALLO,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "ACCT" => Some(FtpCommand::ACCT),
            "REIN" => Some(FtpCommand::REIN),
            "QUIT" => Some(FtpCommand::QUIT),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "PWD" => Some(FtpCommand::PWD),
            "MKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "STAT" => Some(FtpCommand::STAT),
            "TYPE" => Some(FtpCommand::TYPE),
            "STRU" => Some(FtpCommand::STRU),
            "MODE" => Some(FtpCommand::MODE),
            "PORT" => Some(FtpCommand::PORT),
            "EPRT" => Some(FtpCommand::EPRT),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "STOU" => Some(FtpCommand::STOU),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "MLSD" => Some(FtpCommand::MLSD),
            "MLST" => Some(FtpCommand::MLST),
            "REST" => Some(FtpCommand::REST),
            "ABOR" => Some(FtpCommand::ABOR),
            "AUTH" => Some(FtpCommand::AUTH),
            "PBSZ" => Some(FtpCommand::PBSZ),
            "PROT" => Some(FtpCommand::PROT),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "HELP" => Some(FtpCommand::HELP),
            "NOOP" => Some(FtpCommand::NOOP),
            "SYST" => Some(FtpCommand::SYST),
            "ALLO" => Some(FtpCommand::ALLO),
            _ => None,
        }
    }

    /// Commands usable before login. Everything else is gated behind an
    /// authenticated session by the middleware.
    pub fn allowed_before_login(&self) -> bool {
        matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::ACCT
                | FtpCommand::REIN
                | FtpCommand::QUIT
                | FtpCommand::AUTH
                | FtpCommand::PBSZ
                | FtpCommand::PROT
                | FtpCommand::FEAT
                | FtpCommand::OPTS
                | FtpCommand::HELP
                | FtpCommand::NOOP
                | FtpCommand::SYST
        )
    }

    /// Commands that arrange or use the data channel, and therefore conflict
    /// with a transfer already in progress.
    pub fn uses_data_channel(&self) -> bool {
        matches!(
            self,
            FtpCommand::PORT
                | FtpCommand::EPRT
                | FtpCommand::PASV
                | FtpCommand::EPSV
                | FtpCommand::RETR
                | FtpCommand::STOR
                | FtpCommand::APPE
                | FtpCommand::STOU
                | FtpCommand::LIST
                | FtpCommand::NLST
                | FtpCommand::MLSD
        )
    }
}
