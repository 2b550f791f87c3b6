//! Report composition: fan the probes out and merge their results.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::dns::{resolve_records, HickoryDnsBackend};
use super::http_probe::HttpProber;
use super::ssl::TlsInspector;
use super::whois::{parse_whois_text, WhoisClient};
use crate::error::{ToolboxError, ToolboxResult};
use crate::settings::ProbeSettings;
use crate::traits::{CertificateSource, DnsBackend, HttpSource, WhoisSource};
use crate::types::{DomainReport, Target, WhoisInfo};

/// Runs DNS, WHOIS, TLS and HTTP probes for a target and merges the results.
///
/// The probes run concurrently and share no state; the composer writes the
/// report once, after all of them have settled.
#[derive(Clone)]
pub struct ReportComposer {
    dns: Arc<dyn DnsBackend>,
    whois: Arc<dyn WhoisSource>,
    tls: Arc<dyn CertificateSource>,
    http: Arc<dyn HttpSource>,
}

impl ReportComposer {
    pub fn new(
        dns: Arc<dyn DnsBackend>,
        whois: Arc<dyn WhoisSource>,
        tls: Arc<dyn CertificateSource>,
        http: Arc<dyn HttpSource>,
    ) -> Self {
        Self {
            dns,
            whois,
            tls,
            http,
        }
    }

    /// Composer wired to the real network clients.
    pub fn from_settings(settings: &ProbeSettings) -> ToolboxResult<Self> {
        let ns_ip = settings
            .dns_server
            .as_deref()
            .map(|s| {
                s.parse::<IpAddr>().map_err(|_| {
                    ToolboxError::ValidationError(format!("Invalid DNS server address: {s}"))
                })
            })
            .transpose()?;

        let dns = HickoryDnsBackend::with_nameserver(ns_ip);
        debug!("[REPORT] DNS queries go to {}", dns.nameserver());

        Ok(Self::new(
            Arc::new(dns),
            Arc::new(WhoisClient::new(
                &settings.whois_server,
                settings.whois_timeout(),
            )?),
            Arc::new(TlsInspector::new(settings.tls_timeout())),
            Arc::new(HttpProber::new(settings)?),
        ))
    }

    /// Produce the full diagnostic report for `target`. Never fails.
    pub async fn analyze(&self, target: &Target) -> DomainReport {
        info!("[REPORT] Analyzing {target}");
        let start = Instant::now();
        let host = target.host.as_str();

        let (records, whois, certificate, http) = tokio::join!(
            resolve_records(self.dns.as_ref(), host),
            self.whois_info(host),
            self.tls.inspect(host, target.tls_port()),
            self.http.probe(target),
        );

        // An IPv4 literal is its own address even without an A record
        let ip = records.first_ipv4().map(str::to_string).or_else(|| {
            host.parse::<Ipv4Addr>()
                .ok()
                .map(|addr| addr.to_string())
        });

        let mut report = DomainReport::empty(target.clone());
        report.ip = ip;
        report.dns_records = Some(records);
        report.whois = whois;
        report.certificate = Some(certificate);
        report.http_status = http.status_code;
        report.final_url = http.final_url;
        report.http_headers = Some(http.headers);
        report.speed = Some(http.speed);
        report.hosting = Some(http.hosting);
        report.security = Some(http.security);

        info!(
            "[REPORT] Analysis of {target} finished in {:?} (ip={}, whois={}, tls={}, http={})",
            start.elapsed(),
            report.ip.as_deref().unwrap_or("-"),
            report.whois.is_some(),
            report.certificate.as_ref().is_some_and(|c| c.valid),
            report.http_status.is_some()
        );
        report
    }

    async fn whois_info(&self, host: &str) -> Option<WhoisInfo> {
        match self.whois.query(host).await {
            Ok(raw) => {
                let info = parse_whois_text(&raw);
                if info.is_empty() {
                    debug!("[WHOIS] No key/value lines in response for {host}");
                }
                Some(info)
            }
            Err(e) => {
                warn!("[WHOIS] {host}: {e}");
                None
            }
        }
    }
}
