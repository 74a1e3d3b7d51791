use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;

use ferroftpd::config::Config;
use ferroftpd::core_cli::Cli;
use ferroftpd::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Determine the default config path based on the OS
    let default_config_path = if cfg!(target_os = "windows") {
        "etc\\ferroftpd.conf"
    } else {
        "/etc/ferroftpd.conf"
    };

    let config_path = if args.config.is_empty() {
        default_config_path
    } else {
        args.config.as_str()
    };
    let mut config = if std::path::Path::new(config_path).exists() {
        Config::load_from_file(config_path)?
    } else if args.config.is_empty() {
        // No config file is fine; CLI flags and defaults carry the day.
        Config::default()
    } else {
        anyhow::bail!("Configuration file not found: {}", config_path);
    };

    // CLI overrides
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root_dir) = &args.root_dir {
        config.vfs.root_dir = root_dir.clone();
    }
    if let Some((min, max)) = args.parsed_pasv_range() {
        config.pasv.port_min = min;
        config.pasv.port_max = max;
    } else if args.pasv_range.is_some() {
        anyhow::bail!("Invalid --pasv-range; expected min-max");
    }
    if let (Some(cert), Some(key)) = (&args.cert, &args.key) {
        config.tls.enabled = true;
        config.tls.cert_file = cert.clone();
        config.tls.key_file = key.clone();
    }
    if args.implicit_ftps {
        config.tls.implicit = true;
    }
    config.validate().context("Invalid configuration")?;

    // Run the FTP server
    server::run_until_ctrl_c(config).await?;

    Ok(())
}
