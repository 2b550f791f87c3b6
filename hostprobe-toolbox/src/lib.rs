//! Host diagnostics toolbox.
//!
//! Probes a single host for DNS records, WHOIS registration data, TLS certificate
//! details and HTTP response characteristics, and composes them into a
//! [`DomainReport`]. Separately drives time-boxed HTTP load tests that produce a
//! [`LoadTestReport`].
//!
//! Every sub-probe degrades to an absent field on failure; only invalid caller
//! input is surfaced as an error.

mod error;
mod services;
mod settings;
mod traits;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::{
    build_probe_url, detect_hosting_provider, detect_technologies, parse_certificate_dump,
    parse_whois_text, resolve_records, security_posture, validate_load_test, validate_target,
    HickoryDnsBackend, HttpProber, LoadGenerator, ReportComposer, TlsInspector, ToolboxService,
    WhoisClient,
};
pub use settings::{DispatchMode, LoadTestSettings, ProbeSettings};
pub use traits::{CertificateSource, DnsBackend, HttpSource, WhoisSource};
pub use types::{
    CertificateInfo, DnsRecordSet, DomainReport, HostingGuess, HttpProbeOutcome, LoadTestPhase,
    LoadTestReport, MxRecord, RequestSample, SecurityPosture, SoaRecord, SpeedSample, Target,
    WhoisInfo,
};
