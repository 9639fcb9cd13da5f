//! HTTPS and certificate checks.
//!
//! Connects to the destination with `tokio-rustls` (webpki roots) and reads the
//! leaf certificate with `x509-parser`. A handshake that fails verification is
//! reported as an invalid certificate, never as an error to the pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::pki_types::ServerName;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS};

/// Certificate expiry text when the URL is not HTTPS.
pub const NOT_HTTPS: &str = "Not HTTPS";

/// Certificate expiry text when the probe fails.
pub const INVALID_CERTIFICATE: &str = "Invalid Certificate";

/// Leaf certificate details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    /// Negotiated protocol version (e.g. "TLSv1_3")
    pub tls_version: String,
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// Start of validity
    pub valid_from: DateTime<Utc>,
    /// End of validity
    pub valid_to: DateTime<Utc>,
}

/// Fetches the leaf certificate presented by a host.
#[async_trait]
pub trait CertificateProbe: Send + Sync {
    /// Performs a verified TLS handshake with `host:port`.
    ///
    /// # Errors
    ///
    /// Returns an error on connect/handshake failure or timeout, or when the
    /// certificate cannot be parsed.
    async fn probe(&self, host: &str, port: u16) -> Result<CertificateInfo>;
}

/// Outcome of the HTTPS check for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsReport {
    /// Whether the URL scheme is https
    pub is_https: bool,
    /// `YYYY-MM-DD`, "Invalid Certificate", or "Not HTTPS"
    pub certificate_expiry: String,
    /// Full certificate details when the probe succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
}

impl HttpsReport {
    /// Whether the probe was attempted and failed.
    pub fn probe_failed(&self) -> bool {
        self.is_https && self.certificate.is_none()
    }
}

/// Whether a URL uses the https scheme (case-insensitive).
pub fn is_https(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| u.scheme() == "https")
        .unwrap_or_else(|_| url.to_ascii_lowercase().starts_with("https://"))
}

/// Checks the scheme and, for https URLs, probes the certificate.
pub async fn check_https(probe: &dyn CertificateProbe, url: &str) -> HttpsReport {
    if !is_https(url) {
        return HttpsReport {
            is_https: false,
            certificate_expiry: NOT_HTTPS.to_string(),
            certificate: None,
        };
    }

    let target = url::Url::parse(url)
        .ok()
        .and_then(|u| Some((u.host_str()?.to_string(), u.port_or_known_default()?)));
    let Some((host, port)) = target else {
        return HttpsReport {
            is_https: true,
            certificate_expiry: INVALID_CERTIFICATE.to_string(),
            certificate: None,
        };
    };

    match probe.probe(&host, port).await {
        Ok(info) => HttpsReport {
            is_https: true,
            certificate_expiry: info.valid_to.format("%Y-%m-%d").to_string(),
            certificate: Some(info),
        },
        Err(e) => {
            log::warn!("Certificate probe failed for {}: {}", host, e);
            HttpsReport {
                is_https: true,
                certificate_expiry: INVALID_CERTIFICATE.to_string(),
                certificate: None,
            }
        }
    }
}

/// Certificate probe over tokio-rustls with webpki roots.
#[derive(Clone)]
pub struct RustlsCertificateProbe {
    connector: TlsConnector,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl Default for RustlsCertificateProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl RustlsCertificateProbe {
    /// Creates a probe trusting the bundled webpki roots.
    pub fn new() -> Self {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(config)),
            connect_timeout: Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
            handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        }
    }
}

fn asn1_to_utc(time: x509_parser::time::ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| anyhow::anyhow!("Certificate time out of range"))
}

#[async_trait]
impl CertificateProbe for RustlsCertificateProbe {
    async fn probe(&self, host: &str, port: u16) -> Result<CertificateInfo> {
        log::debug!("Probing certificate for {host}:{port}");

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| anyhow::anyhow!("Invalid domain name {}: {}", host, e))?;

        let sock = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((host, port)),
        )
        .await
        {
            Ok(Ok(sock)) => sock,
            Ok(Err(e)) => return Err(anyhow::anyhow!("Failed to connect to {}:{} - {}", host, port, e)),
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "TCP connection timeout for {}:{} ({}s)",
                    host,
                    port,
                    self.connect_timeout.as_secs()
                ))
            }
        };

        let tls_stream = match tokio::time::timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, sock),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(anyhow::anyhow!("TLS handshake failed for {}: {}", host, e)),
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "TLS handshake timeout for {} ({}s)",
                    host,
                    self.handshake_timeout.as_secs()
                ))
            }
        };

        let connection = tls_stream.get_ref().1;
        let tls_version = connection
            .protocol_version()
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "Unknown".to_string());

        let cert = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| anyhow::anyhow!("No peer certificate presented by {}", host))?;

        let (_, cert) = x509_parser::parse_x509_certificate(cert.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to parse certificate for {}: {}", host, e))?;
        let tbs_cert = &cert.tbs_certificate;

        let info = CertificateInfo {
            tls_version,
            subject: tbs_cert.subject.to_string(),
            issuer: tbs_cert.issuer.to_string(),
            valid_from: asn1_to_utc(tbs_cert.validity.not_before)?,
            valid_to: asn1_to_utc(tbs_cert.validity.not_after)?,
        };
        log::debug!("Certificate for {} valid until {}", host, info.valid_to);
        Ok(info)
    }
}
