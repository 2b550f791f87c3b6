//! Certificate inspection against a local TLS listener.

#![cfg(feature = "rustls")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use hostprobe_toolbox::{CertificateInfo, CertificateSource, TlsInspector};
use rustls::crypto::CryptoProvider;
use rustls::ServerConfig;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

// Self-signed, CN=localhost, SAN localhost + www.localhost, valid until 2126
const LOCALHOST_CERT: &str = include_str!("fixtures/localhost.crt");
const LOCALHOST_KEY: &str = include_str!("fixtures/localhost.key");
// Self-signed, CN=expired.localhost, valid 2020-01-01 .. 2021-01-01
const EXPIRED_CERT: &str = include_str!("fixtures/expired.crt");
const EXPIRED_KEY: &str = include_str!("fixtures/expired.key");

// ============ Test listener ============

/// Serve `cert` over TLS on every accepted connection.
async fn spawn_tls_listener(cert: &str, key: &str) -> u16 {
    let _ = CryptoProvider::install_default(rustls::crypto::ring::default_provider());

    let certs = vec![CertificateDer::from_pem_slice(cert.as_bytes()).unwrap()];
    let key = PrivateKeyDer::from_pem_slice(key.as_bytes()).unwrap();
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(socket).await {
                    // Hold the session open until the client hangs up
                    let mut buf = [0u8; 64];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });
    port
}

fn inspector() -> TlsInspector {
    TlsInspector::new(Duration::from_secs(5))
}

// ============ Tests ============

#[tokio::test]
async fn test_inspect_self_signed_reports_leaf() {
    let port = spawn_tls_listener(LOCALHOST_CERT, LOCALHOST_KEY).await;

    let info = inspector().inspect("localhost", port).await;
    assert!(info.valid, "self-signed leaf should still be reported");
    assert_eq!(info.issuer.as_deref(), Some("CN=localhost"));
    assert_eq!(info.subject.as_deref(), Some("CN=localhost"));
    assert_eq!(
        info.alt_names,
        Some(vec!["localhost".to_string(), "www.localhost".to_string()])
    );
    assert_eq!(info.hostname_matches, Some(true));
    assert!(info.days_remaining.unwrap() > 0);
    assert!(info.valid_from.is_some());
    assert!(info.valid_to.is_some());
    assert!(info.serial_number.is_some());
    assert_eq!(info.trusted, Some(false));
}

#[tokio::test]
async fn test_inspect_expired_and_mismatched_certificate() {
    let port = spawn_tls_listener(EXPIRED_CERT, EXPIRED_KEY).await;

    let info = inspector().inspect("localhost", port).await;
    assert!(info.valid);
    assert_eq!(info.subject.as_deref(), Some("CN=expired.localhost"));
    assert_eq!(
        info.alt_names,
        Some(vec!["expired.localhost".to_string()])
    );
    assert_eq!(info.hostname_matches, Some(false));
    assert!(info.days_remaining.unwrap() < 0);
    assert_eq!(info.trusted, Some(false));
}

#[tokio::test]
async fn test_inspect_ipv4_literal_target() {
    let port = spawn_tls_listener(LOCALHOST_CERT, LOCALHOST_KEY).await;

    let info = inspector().inspect("127.0.0.1", port).await;
    assert!(info.valid);
    assert_eq!(info.subject.as_deref(), Some("CN=localhost"));
    assert_eq!(info.hostname_matches, Some(false));
}

#[tokio::test]
async fn test_inspect_plain_listener_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    let info = TlsInspector::new(Duration::from_millis(500))
        .inspect("127.0.0.1", port)
        .await;
    assert_eq!(info, CertificateInfo::unavailable());
}
