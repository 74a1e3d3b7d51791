use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVE_CONNECT_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_IMPLICIT_TLS_PORT,
    DEFAULT_PASV_ACCEPT_TIMEOUT_SECS, DEFAULT_PASV_PORT_MAX, DEFAULT_PASV_PORT_MIN,
    DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    /// Optional greeting banner file sent as a multi-line 220.
    pub banner_file: Option<String>,
    pub idle_timeout_secs: u64,
    /// Advertise UTF8 in FEAT and honour OPTS UTF8.
    pub utf8: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 21,
            banner_file: None,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            utf8: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasvConfig {
    /// Address advertised in 227 replies. Usually the public IP.
    pub pasv_address: String,
    pub port_min: u16,
    pub port_max: u16,
    pub accept_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// When false, passive data peers must come from the control peer's
    /// address; anything else is closed immediately.
    pub promiscuous: bool,
}

impl Default for PasvConfig {
    fn default() -> Self {
        Self {
            pasv_address: String::from("127.0.0.1"),
            port_min: DEFAULT_PASV_PORT_MIN,
            port_max: DEFAULT_PASV_PORT_MAX,
            accept_timeout_secs: DEFAULT_PASV_ACCEPT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_ACTIVE_CONNECT_TIMEOUT_SECS,
            promiscuous: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsSettings {
    pub enabled: bool,
    pub cert_file: String,
    pub key_file: String,
    /// Separate listener that negotiates TLS immediately on accept.
    pub implicit: bool,
    pub implicit_port: u16,
    pub handshake_timeout_secs: u64,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: String::from("etc/ssl/cert.pem"),
            key_file: String::from("etc/ssl/key.pem"),
            implicit: false,
            implicit_port: DEFAULT_IMPLICIT_TLS_PORT,
            handshake_timeout_secs: DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// `anonymous` or `passwd`.
    pub provider: String,
    pub passwd_file: String,
    pub allow_anonymous: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: String::from("anonymous"),
            passwd_file: String::from("etc/ftpd.passwd"),
            allow_anonymous: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Filesystem directory the virtual root maps to.
    pub root_dir: String,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            root_dir: String::from("/srv/ftp"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pasv: PasvConfig,
    pub tls: TlsSettings,
    pub auth: AuthConfig,
    pub vfs: VfsConfig,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pasv.port_min > self.pasv.port_max {
            anyhow::bail!(
                "Invalid passive port range: {}-{}",
                self.pasv.port_min,
                self.pasv.port_max
            );
        }
        if self.tls.implicit && !self.tls.enabled {
            anyhow::bail!("Implicit FTPS requires tls.enabled = true");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen_port, 21);
        assert!(!config.pasv.promiscuous);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 2121

            [pasv]
            pasv_address = "192.0.2.7"
            port_min = 50000
            port_max = 50100
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.pasv.pasv_address, "192.0.2.7");
        assert_eq!(config.pasv.port_min, 50000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_pasv_range() {
        let mut config = Config::default();
        config.pasv.port_min = 60000;
        config.pasv.port_max = 50000;
        assert!(config.validate().is_err());
    }
}
