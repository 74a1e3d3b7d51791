use crate::config::TlsSettings;
use crate::core_tls::error::TlsError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::{rustls, server::TlsStream, TlsAcceptor};

/// The server certificate and handshake machinery, shared read-only by every
/// connection. The same acceptor protects the control channel (implicit or
/// after AUTH TLS) and PROT P data channels.
#[derive(Clone)]
pub struct TlsContext {
    acceptor: TlsAcceptor,
    handshake_timeout: Duration,
}

impl TlsContext {
    pub fn from_settings(settings: &TlsSettings) -> Result<Self, TlsError> {
        Self::new(
            &settings.cert_file,
            &settings.key_file,
            Duration::from_secs(settings.handshake_timeout_secs),
        )
    }

    pub fn new(
        cert_file: &str,
        key_file: &str,
        handshake_timeout: Duration,
    ) -> Result<Self, TlsError> {
        if !Path::new(cert_file).exists() || !Path::new(key_file).exists() {
            return Err(TlsError::TlsNotConfigured);
        }

        let certs = match std::fs::read(cert_file) {
            Ok(c) => c,
            Err(e) => return Err(TlsError::CertificateLoadError(e.to_string())),
        };

        let key = match std::fs::read(key_file) {
            Ok(k) => k,
            Err(e) => return Err(TlsError::PrivateKeyLoadError(e.to_string())),
        };

        let cert_chain = match rustls_pemfile::certs(&mut &certs[..]) {
            Ok(c) => c,
            Err(e) => return Err(TlsError::CertificateLoadError(e.to_string())),
        };
        if cert_chain.is_empty() {
            return Err(TlsError::CertificateLoadError(
                "No certificate found".to_string(),
            ));
        }

        let mut keys = match rustls_pemfile::pkcs8_private_keys(&mut &key[..]) {
            Ok(k) => k,
            Err(e) => return Err(TlsError::PrivateKeyLoadError(e.to_string())),
        };
        if keys.is_empty() {
            // Fall back to RSA (PKCS#1) keys.
            keys = match rustls_pemfile::rsa_private_keys(&mut &key[..]) {
                Ok(k) => k,
                Err(e) => return Err(TlsError::PrivateKeyLoadError(e.to_string())),
            };
        }

        let private_key = match keys.pop() {
            Some(k) => k,
            None => {
                return Err(TlsError::PrivateKeyLoadError(
                    "No private key found".to_string(),
                ))
            }
        };

        let cert_chain: Vec<rustls::Certificate> =
            cert_chain.into_iter().map(rustls::Certificate).collect();
        let private_key = rustls::PrivateKey(private_key);

        let config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;

        Ok(Self {
            acceptor: TlsAcceptor::from(Arc::new(config)),
            handshake_timeout,
        })
    }

    /// Runs the server-side handshake over any duplex stream, bounded by the
    /// configured handshake timeout.
    pub async fn accept<S>(&self, stream: S) -> Result<TlsStream<S>, TlsError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match tokio::time::timeout(self.handshake_timeout, self.acceptor.accept(stream)).await {
            Ok(Ok(tls_stream)) => Ok(tls_stream),
            Ok(Err(e)) => Err(TlsError::TlsHandshakeError(e.to_string())),
            Err(_) => Err(TlsError::TlsHandshakeTimeout),
        }
    }
}
