//! SSL/TLS certificate inspection module.
//!
//! Uses rustls for the handshake and x509-parser for the leaf certificate.
//! The handshake accepts any presented chain so that self-signed, expired or
//! mismatched certificates are still reported; trust against the web PKI
//! roots is checked separately and reported as `trusted`.
//! Every failure collapses into [`CertificateInfo::unavailable`].

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, trace, warn};
use regex::Regex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::error::{ToolboxError, ToolboxResult};
use crate::traits::CertificateSource;
use crate::types::CertificateInfo;

/// Initialize the rustls `CryptoProvider` (once).
///
/// `install_default` returns `Err` only when a provider is already installed,
/// which is fine.
fn ensure_crypto_provider() {
    let _ = CryptoProvider::install_default(rustls::crypto::ring::default_provider());
}

/// Accepts whatever chain the server presents. Handshake signatures are
/// still verified against the leaf key.
#[derive(Debug)]
struct InspectOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InspectOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Certificate inspector performing a direct TLS handshake.
pub struct TlsInspector {
    connector: TlsConnector,
    /// `None` when the web PKI verifier could not be built; `trusted` is then
    /// left unset.
    trust: Option<Arc<WebPkiServerVerifier>>,
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(handshake_timeout: Duration) -> Self {
        ensure_crypto_provider();
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let trust = WebPkiServerVerifier::builder_with_provider(
            Arc::new(root_store),
            Arc::clone(&provider),
        )
        .build()
        .inspect_err(|e| warn!("[SSL] Web PKI verifier unavailable: {e}"))
        .ok();

        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InspectOnlyVerifier { provider }))
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(config)),
            trust,
            timeout: handshake_timeout,
        }
    }

    /// Connect, handshake and extract the leaf certificate.
    async fn fetch_leaf(&self, host: &str, port: u16) -> ToolboxResult<CertificateInfo> {
        let start_time = Instant::now();

        trace!("[SSL] Establishing TCP connection to {host}:{port}...");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("Connection failed: {e}")))?;
        trace!(
            "[SSL] TCP connection succeeded, took {:?}",
            start_time.elapsed()
        );

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ToolboxError::ValidationError(format!("Invalid server name: {host}")))?;

        trace!("[SSL] Performing TLS handshake...");
        let tls_stream = self
            .connector
            .connect(server_name.clone(), stream)
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("TLS handshake failed: {e}")))?;

        let (_, tls_conn) = tls_stream.get_ref();
        let chain = tls_conn.peer_certificates().unwrap_or_default();
        let leaf = chain
            .first()
            .ok_or_else(|| ToolboxError::NetworkError("No certificate found".to_string()))?;

        let (_, cert) = X509Certificate::from_der(leaf.as_ref())
            .map_err(|e| ToolboxError::ParseError(format!("Certificate parsing failed: {e}")))?;

        let mut info = parse_certificate(host, &cert);
        info.trusted = self.chain_trusted(chain, &server_name);
        debug!(
            "[SSL] Check completed: {host}:{port} - sans={}, days_remaining={:?}, trusted={:?}, total_time={:?}",
            info.alt_names.as_ref().map_or(0, Vec::len),
            info.days_remaining,
            info.trusted,
            start_time.elapsed()
        );
        Ok(info)
    }

    /// Verify the presented chain against the web PKI roots for `server_name`.
    fn chain_trusted(
        &self,
        chain: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
    ) -> Option<bool> {
        let verifier = self.trust.as_ref()?;
        let (end_entity, intermediates) = chain.split_first()?;
        match verifier.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            &[],
            UnixTime::now(),
        ) {
            Ok(_) => Some(true),
            Err(e) => {
                debug!("[SSL] Chain not trusted: {e}");
                Some(false)
            }
        }
    }
}

#[async_trait]
impl CertificateSource for TlsInspector {
    async fn inspect(&self, host: &str, port: u16) -> CertificateInfo {
        debug!("[SSL] Starting check for {host}:{port}");
        match timeout(self.timeout, self.fetch_leaf(host, port)).await {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                warn!("[SSL] {host}:{port}: {e}");
                CertificateInfo::unavailable()
            }
            Err(_) => {
                warn!(
                    "[SSL] {host}:{port}: TLS check timed out ({}s)",
                    self.timeout.as_secs()
                );
                CertificateInfo::unavailable()
            }
        }
    }
}

/// Extract report fields from a parsed leaf certificate.
fn parse_certificate(query: &str, cert: &X509Certificate<'_>) -> CertificateInfo {
    let validity = cert.validity();
    let valid_to = validity.not_after.to_rfc2822().ok();
    let valid_from = validity.not_before.to_rfc2822().ok();
    let days_remaining = days_until(validity.not_after.timestamp(), chrono::Utc::now());

    let san: Vec<String> = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some((*dns).to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok());

    CertificateInfo {
        valid: true,
        issuer: Some(cert.issuer().to_string()),
        subject: Some(cert.subject().to_string()),
        valid_from,
        valid_to,
        hostname_matches: Some(check_domain_match(query, cn, &san)),
        alt_names: Some(san),
        days_remaining,
        serial_number: Some(cert.serial.to_str_radix(16).to_uppercase()),
        trusted: None,
    }
}

/// Whole days from `now` until the unix timestamp `not_after` (negative once expired).
fn days_until(not_after: i64, now: chrono::DateTime<chrono::Utc>) -> Option<i64> {
    chrono::DateTime::from_timestamp(not_after, 0).map(|expiry| (expiry - now).num_days())
}

/// Check whether the queried host matches the certificate's CN or SANs.
fn check_domain_match(query: &str, cn: Option<&str>, san: &[String]) -> bool {
    let query_lower = query.to_lowercase();

    if cn.is_some_and(|cn| matches_domain(&query_lower, &cn.to_lowercase())) {
        return true;
    }

    san.iter()
        .any(|name| matches_domain(&query_lower, &name.to_lowercase()))
}

/// Domain matching with single-level wildcard support.
fn matches_domain(query: &str, pattern: &str) -> bool {
    if query == pattern {
        return true;
    }

    // *.example.com matches foo.example.com but not foo.bar.example.com
    pattern
        .strip_prefix("*.")
        .and_then(|suffix| query.strip_suffix(suffix))
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
}

static ISSUER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Issuer: (.+)").ok());
static SUBJECT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Subject: (.+)").ok());
static NOT_BEFORE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Not Before: (.+)").ok());
static NOT_AFTER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Not After : (.+)").ok());
static SAN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"DNS:([^,\s]+)").ok());

fn first_capture(re: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
    re.as_ref()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
}

/// Parse a textual certificate dump (`openssl x509 -noout -text` layout).
///
/// Fields whose line is missing stay `None`; `alt_names` lists every `DNS:`
/// token in dump order. A dump yielding no fields at all is treated as no
/// certificate data.
pub fn parse_certificate_dump(text: &str) -> CertificateInfo {
    let alt_names: Vec<String> = SAN_RE
        .as_ref()
        .map(|re| {
            re.captures_iter(text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect()
        })
        .unwrap_or_default();

    let info = CertificateInfo {
        valid: true,
        issuer: first_capture(&ISSUER_RE, text),
        subject: first_capture(&SUBJECT_RE, text),
        valid_from: first_capture(&NOT_BEFORE_RE, text),
        valid_to: first_capture(&NOT_AFTER_RE, text),
        alt_names: (!alt_names.is_empty()).then_some(alt_names),
        ..CertificateInfo::default()
    };

    if info.issuer.is_none()
        && info.subject.is_none()
        && info.valid_from.is_none()
        && info.valid_to.is_none()
        && info.alt_names.is_none()
    {
        return CertificateInfo::unavailable();
    }
    info
}
