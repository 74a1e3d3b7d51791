use thiserror::Error;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Failed to load SSL certificate: {0}")]
    CertificateLoadError(String),

    #[error("Failed to load SSL private key: {0}")]
    PrivateKeyLoadError(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshakeError(String),

    #[error("TLS handshake timed out")]
    TlsHandshakeTimeout,

    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),

    #[error("TLS not configured")]
    TlsNotConfigured,
}

impl TlsError {
    /// Reply sent when an explicit AUTH TLS upgrade fails; the cleartext
    /// control channel stays open afterwards.
    pub fn to_ftp_response(&self) -> String {
        match self {
            TlsError::TlsNotConfigured => {
                "534 TLS not available on this server.".to_string()
            }
            _ => "431 Need some unavailable resource to process security.".to_string(),
        }
    }
}
