use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "An FTPS-capable FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Override the control listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the filesystem directory served as the virtual root
    #[arg(short, long)]
    pub root_dir: Option<String>,

    /// Override the passive port range, e.g. 50000-50100
    #[arg(long)]
    pub pasv_range: Option<String>,

    /// Path to the TLS certificate (enables TLS together with --key)
    #[arg(long)]
    pub cert: Option<String>,

    /// Path to the TLS private key
    #[arg(long)]
    pub key: Option<String>,

    /// Accept implicit FTPS on its own listener
    #[arg(long)]
    pub implicit_ftps: bool,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// `min-max` as given on the command line.
    pub fn parsed_pasv_range(&self) -> Option<(u16, u16)> {
        let raw = self.pasv_range.as_deref()?;
        let (min, max) = raw.split_once('-')?;
        match (min.trim().parse(), max.trim().parse()) {
            (Ok(min), Ok(max)) => Some((min, max)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasv_range_parses() {
        let cli = Cli::parse_from(["ferroftpd", "--pasv-range", "50000-50100"]);
        assert_eq!(cli.parsed_pasv_range(), Some((50000, 50100)));

        let cli = Cli::parse_from(["ferroftpd", "--pasv-range", "bogus"]);
        assert_eq!(cli.parsed_pasv_range(), None);
    }
}
