//! Public types returned by toolbox operations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The host (and optional port) a diagnostic run is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Hostname or dotted IPv4 literal.
    pub host: String,
    /// Explicit port, if the caller supplied one.
    pub port: Option<u16>,
}

impl Target {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Port used for the TLS handshake (443 unless overridden).
    pub fn tls_port(&self) -> u16 {
        self.port.unwrap_or(443)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => write!(f, "{}", self.host),
        }
    }
}

/// A mail exchange record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRecord {
    /// Mail server host name (trailing dot removed).
    pub exchange: String,
    /// Preference value; lower is preferred.
    pub priority: u16,
}

/// Start of authority record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaRecord {
    /// Primary name server.
    pub nsname: String,
    /// Responsible mailbox, in DNS name form.
    pub hostmaster: String,
    pub serial: u32,
    pub refresh: i32,
    pub retry: i32,
    pub expire: i32,
    pub minttl: u32,
}

/// DNS records resolved for a host.
///
/// Every record type is resolved independently; a type that failed or returned
/// nothing is `None` without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DnsRecordSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mx: Option<Vec<MxRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<Vec<String>>,
    /// TXT records, each kept as its list of character-strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txt: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa: Option<SoaRecord>,
}

impl DnsRecordSet {
    /// First resolved IPv4 address, used as the report's primary IP.
    pub fn first_ipv4(&self) -> Option<&str> {
        self.a.as_ref().and_then(|a| a.first()).map(String::as_str)
    }
}

/// Parsed WHOIS data: normalized lower-case, underscore-joined keys to values.
pub type WhoisInfo = BTreeMap<String, String>;

/// TLS certificate details for the leaf certificate.
///
/// `valid == false` with every other field absent means no certificate data
/// could be retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    /// Whether certificate data was retrieved.
    pub valid: bool,
    /// Issuer distinguished name (e.g. `"CN=R11, O=Let's Encrypt, C=US"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Subject distinguished name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Not-before timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    /// Not-after timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    /// DNS Subject Alternative Names in certificate order (duplicates kept).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<Vec<String>>,
    /// Days until expiration (negative if expired).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// Whether the queried host matches the certificate CN or a SAN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname_matches: Option<bool>,
    /// Serial number (upper-case hex).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// Whether the presented chain verifies against the web PKI roots for the
    /// queried name. Self-signed, expired or mismatched certificates are still
    /// reported with `trusted: false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted: Option<bool>,
}

impl CertificateInfo {
    /// The "no certificate data" value.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Security header posture derived from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPosture {
    pub hsts: bool,
    pub csp: bool,
    pub x_frame: bool,
    /// Labels of the security headers present, in fixed check order.
    pub security_headers: Vec<String>,
}

/// Best-effort guess about what serves the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostingGuess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub technologies: Vec<String>,
}

/// Timing of the diagnostic HTTP request.
///
/// `ttfb_ms` equals `response_time_ms`; no separate first-byte timing is taken.
/// Both are `-1` when the request failed at the transport level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedSample {
    pub response_time_ms: f64,
    pub ttfb_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_bytes_per_sec: Option<f64>,
}

impl SpeedSample {
    /// Failure sentinel: negative latency.
    pub fn failed() -> Self {
        Self {
            response_time_ms: -1.0,
            ttfb_ms: -1.0,
            download_bytes_per_sec: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.response_time_ms < 0.0
    }
}

/// Everything one diagnostic HTTP request produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProbeOutcome {
    /// Response headers, lower-case names; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Final status code, `None` on transport failure.
    pub status_code: Option<u16>,
    /// URL after following redirects.
    pub final_url: Option<String>,
    pub speed: SpeedSample,
    pub hosting: HostingGuess,
    pub security: SecurityPosture,
}

impl HttpProbeOutcome {
    /// Transport-failure sentinel.
    pub fn failed() -> Self {
        Self {
            headers: BTreeMap::new(),
            status_code: None,
            final_url: None,
            speed: SpeedSample::failed(),
            hosting: HostingGuess::default(),
            security: SecurityPosture::default(),
        }
    }
}

/// Composed diagnostics for one target.
///
/// Absent fields mean that probe failed or did not apply; they never make the
/// whole report an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainReport {
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_records: Option<DnsRecordSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// URL of the last response after following redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<SpeedSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingGuess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityPosture>,
}

impl DomainReport {
    /// A report with every probe field absent.
    pub fn empty(target: Target) -> Self {
        Self {
            target,
            ip: None,
            dns_records: None,
            whois: None,
            certificate: None,
            http_headers: None,
            http_status: None,
            final_url: None,
            speed: None,
            hosting: None,
            security: None,
        }
    }
}

/// Outcome of a single load-test request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSample {
    pub success: bool,
    pub latency_ms: f64,
    pub error_message: Option<String>,
}

impl RequestSample {
    pub fn succeeded(latency_ms: f64) -> Self {
        Self {
            success: true,
            latency_ms,
            error_message: None,
        }
    }

    pub fn failed(latency_ms: f64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_ms,
            error_message: Some(message.into()),
        }
    }
}

/// Lifecycle of a load generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadTestPhase {
    Idle,
    Running,
    Draining,
    Completed,
}

impl fmt::Display for LoadTestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Aggregate statistics of a finished load test.
///
/// `total_requests == successful_requests + failed_requests` always holds.
/// Latency figures cover successful requests only and are `0` when none
/// succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestReport {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub requests_per_second: f64,
    /// Failure messages in completion order.
    pub errors: Vec<String>,
    /// Requested concurrency.
    pub concurrency: u32,
    /// Wall time from first launch to drain completion, in seconds.
    pub duration_secs: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        assert_eq!(Target::new("example.com", None).to_string(), "example.com");
        assert_eq!(
            Target::new("example.com", Some(8443)).to_string(),
            "example.com:8443"
        );
    }

    #[test]
    fn test_target_tls_port_default() {
        assert_eq!(Target::new("example.com", None).tls_port(), 443);
        assert_eq!(Target::new("example.com", Some(8443)).tls_port(), 8443);
    }

    #[test]
    fn test_dns_record_set_first_ipv4() {
        let set = DnsRecordSet {
            a: Some(vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]),
            ..DnsRecordSet::default()
        };
        assert_eq!(set.first_ipv4(), Some("1.2.3.4"));
        assert_eq!(DnsRecordSet::default().first_ipv4(), None);
    }

    #[test]
    fn test_certificate_unavailable_serializes_only_valid() {
        let json = serde_json::to_value(CertificateInfo::unavailable()).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": false }));
    }

    #[test]
    fn test_http_outcome_failed_sentinel() {
        let outcome = HttpProbeOutcome::failed();
        assert!(outcome.headers.is_empty());
        assert!(outcome.speed.is_failure());
        assert!((outcome.speed.ttfb_ms + 1.0).abs() < f64::EPSILON);
        assert_eq!(outcome.security, SecurityPosture::default());
        assert_eq!(outcome.hosting, HostingGuess::default());
    }

    #[test]
    fn test_dns_record_set_serializes_upper_case_keys() {
        let set = DnsRecordSet {
            mx: Some(vec![MxRecord {
                exchange: "mail.example.com".to_string(),
                priority: 10,
            }]),
            ..DnsRecordSet::default()
        };
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("MX").is_some());
        assert!(json.get("A").is_none());
    }
}
