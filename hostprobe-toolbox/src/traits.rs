//! Probe abstraction traits.
//!
//! Each network-facing probe sits behind a trait so the report composer can be
//! driven by the real clients or by test doubles.

use async_trait::async_trait;

use crate::error::ToolboxResult;
use crate::types::{CertificateInfo, HttpProbeOutcome, MxRecord, SoaRecord, Target};

/// Per-record-type DNS lookups.
///
/// Implementations return `Err` for NXDOMAIN, timeouts or empty answers; the
/// caller degrades that single type to absent.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    async fn lookup_a(&self, host: &str) -> ToolboxResult<Vec<String>>;

    async fn lookup_aaaa(&self, host: &str) -> ToolboxResult<Vec<String>>;

    async fn lookup_mx(&self, host: &str) -> ToolboxResult<Vec<MxRecord>>;

    async fn lookup_ns(&self, host: &str) -> ToolboxResult<Vec<String>>;

    async fn lookup_txt(&self, host: &str) -> ToolboxResult<Vec<Vec<String>>>;

    async fn lookup_cname(&self, host: &str) -> ToolboxResult<Vec<String>>;

    async fn lookup_soa(&self, host: &str) -> ToolboxResult<SoaRecord>;
}

/// Source of raw WHOIS text.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    async fn query(&self, domain: &str) -> ToolboxResult<String>;
}

/// Retrieves leaf certificate details.
///
/// Never fails: total failure is [`CertificateInfo::unavailable`].
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn inspect(&self, host: &str, port: u16) -> CertificateInfo;
}

/// Issues the single diagnostic HTTP request.
///
/// Never fails: transport failure is [`HttpProbeOutcome::failed`].
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn probe(&self, target: &Target) -> HttpProbeOutcome;
}
