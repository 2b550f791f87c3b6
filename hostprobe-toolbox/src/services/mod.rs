//! Service façade exposing the toolbox operations.
//!
//! The associated functions on [`ToolboxService`] validate caller input, then
//! hand off to the probe and load-generation services. Invalid input is the only
//! error they return.

mod dns;
mod http_probe;
mod report;
mod resolver;
mod ssl;
mod whois;

use std::net::Ipv4Addr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

pub use dns::{resolve_records, HickoryDnsBackend};
pub use http_probe::{
    build_probe_url, detect_hosting_provider, detect_technologies, security_posture, HttpProber,
};
pub use load_test::LoadGenerator;
pub use report::ReportComposer;
pub use ssl::{parse_certificate_dump, TlsInspector};
pub use whois::{parse_whois_text, WhoisClient};

use crate::error::{ToolboxError, ToolboxResult};
use crate::settings::{LoadTestSettings, ProbeSettings};
use crate::types::{DomainReport, LoadTestReport, Target};

const MAX_HOST_LEN: usize = 253;
const CONCURRENCY_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
const DURATION_RANGE_SECS: std::ops::RangeInclusive<u64> = 5..=300;

static HOSTNAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    )
    .ok()
});

/// Validate a host name or IPv4 literal and an optional port.
///
/// Trims surrounding whitespace. Rejects empty or overlong hosts, anything that
/// is neither a syntactically valid hostname nor a dotted IPv4 address, and
/// port 0.
pub fn validate_target(host: &str, port: Option<u16>) -> ToolboxResult<Target> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ToolboxError::ValidationError(
            "Domain name is required".to_string(),
        ));
    }
    if host.len() > MAX_HOST_LEN {
        return Err(ToolboxError::ValidationError(format!(
            "Domain name exceeds maximum length of {MAX_HOST_LEN} characters (got {})",
            host.len()
        )));
    }

    let is_ipv4 = host.parse::<Ipv4Addr>().is_ok();
    let is_hostname = HOSTNAME_RE.as_ref().is_some_and(|re| re.is_match(host));
    if !is_ipv4 && !is_hostname {
        return Err(ToolboxError::ValidationError(format!(
            "Invalid domain name or IP address: {host}"
        )));
    }

    if port == Some(0) {
        return Err(ToolboxError::ValidationError(
            "Port must be between 1 and 65535".to_string(),
        ));
    }

    Ok(Target::new(host, port))
}

/// Validate load-test parameters, returning the run duration.
pub fn validate_load_test(concurrency: u32, duration_secs: u64) -> ToolboxResult<Duration> {
    if !CONCURRENCY_RANGE.contains(&concurrency) {
        return Err(ToolboxError::ValidationError(format!(
            "Concurrent users must be between {} and {} (got {concurrency})",
            CONCURRENCY_RANGE.start(),
            CONCURRENCY_RANGE.end()
        )));
    }
    if !DURATION_RANGE_SECS.contains(&duration_secs) {
        return Err(ToolboxError::ValidationError(format!(
            "Duration must be between {} and {} seconds (got {duration_secs})",
            DURATION_RANGE_SECS.start(),
            DURATION_RANGE_SECS.end()
        )));
    }
    Ok(Duration::from_secs(duration_secs))
}

/// Entry point for host diagnostics and load testing.
///
/// ```rust,no_run
/// use hostprobe_toolbox::ToolboxService;
/// # async fn demo() -> hostprobe_toolbox::ToolboxResult<()> {
/// let report = ToolboxService::analyze("example.com", None).await?;
/// println!("{:?}", report.ip);
/// # Ok(())
/// # }
/// ```
pub struct ToolboxService;

impl ToolboxService {
    /// Analyze a host with default probe settings.
    pub async fn analyze(host: &str, port: Option<u16>) -> ToolboxResult<DomainReport> {
        let target = validate_target(host, port)?;
        let composer = ReportComposer::from_settings(&ProbeSettings::default())?;
        Ok(composer.analyze(&target).await)
    }

    /// Analyze a host with a preconfigured composer.
    pub async fn analyze_with(
        composer: &ReportComposer,
        host: &str,
        port: Option<u16>,
    ) -> ToolboxResult<DomainReport> {
        let target = validate_target(host, port)?;
        Ok(composer.analyze(&target).await)
    }

    /// Run a load test with default settings.
    pub async fn load_test(
        host: &str,
        port: Option<u16>,
        concurrency: u32,
        duration_secs: u64,
    ) -> ToolboxResult<LoadTestReport> {
        let target = validate_target(host, port)?;
        let duration = validate_load_test(concurrency, duration_secs)?;
        let generator = LoadGenerator::new(LoadTestSettings::default())?;
        Ok(generator.run(&target, concurrency, duration).await)
    }

    /// Run a load test on a preconfigured generator.
    pub async fn load_test_with(
        generator: &LoadGenerator,
        host: &str,
        port: Option<u16>,
        concurrency: u32,
        duration_secs: u64,
    ) -> ToolboxResult<LoadTestReport> {
        let target = validate_target(host, port)?;
        let duration = validate_load_test(concurrency, duration_secs)?;
        Ok(generator.run(&target, concurrency, duration).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target_normal() {
        let target = validate_target("example.com", None).unwrap();
        assert_eq!(target, Target::new("example.com", None));
    }

    #[test]
    fn test_validate_target_trims_whitespace() {
        let target = validate_target("  sub.example.com  ", Some(8443)).unwrap();
        assert_eq!(target.host, "sub.example.com");
        assert_eq!(target.port, Some(8443));
    }

    #[test]
    fn test_validate_target_ipv4() {
        assert_eq!(validate_target("1.2.3.4", None).unwrap().host, "1.2.3.4");
    }

    #[test]
    fn test_validate_target_single_label() {
        assert!(validate_target("localhost", None).is_ok());
    }

    #[test]
    fn test_validate_target_empty() {
        assert!(matches!(
            validate_target("   ", None),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_target_invalid() {
        for host in [
            "not a valid domain!!!",
            "-example.com",
            "example-.com",
            "example..com",
            "https://example.com",
            "::1",
        ] {
            assert!(
                matches!(
                    validate_target(host, None),
                    Err(ToolboxError::ValidationError(_))
                ),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_target_too_long() {
        let host = format!("{}.com", "a.".repeat(130));
        assert!(host.len() > MAX_HOST_LEN);
        assert!(matches!(
            validate_target(&host, None),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_target_port_zero() {
        assert!(matches!(
            validate_target("example.com", Some(0)),
            Err(ToolboxError::ValidationError(_))
        ));
        assert!(validate_target("example.com", Some(65535)).is_ok());
    }

    #[test]
    fn test_validate_load_test_bounds() {
        assert_eq!(validate_load_test(1, 5).unwrap(), Duration::from_secs(5));
        assert_eq!(
            validate_load_test(100, 300).unwrap(),
            Duration::from_secs(300)
        );
        assert!(validate_load_test(0, 10).is_err());
        assert!(validate_load_test(101, 10).is_err());
        assert!(validate_load_test(10, 4).is_err());
        assert!(validate_load_test(10, 301).is_err());
    }

    #[tokio::test]
    async fn test_load_test_rejects_before_running() {
        let result = ToolboxService::load_test("example.com", None, 0, 10).await;
        assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_host() {
        let result = ToolboxService::analyze("bad host", None).await;
        assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
    }
}
