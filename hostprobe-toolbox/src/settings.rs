//! Tunable probe and load-test settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and endpoints used by the diagnostic probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// WHOIS responder queried first; referrals are followed from there.
    pub whois_server: String,
    pub whois_timeout_secs: u64,
    pub tls_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub max_redirects: usize,
    /// Nameserver IP to use instead of the system resolver configuration.
    pub dns_server: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            whois_server: "whois.iana.org".to_string(),
            whois_timeout_secs: 10,
            tls_timeout_secs: 10,
            http_timeout_secs: 10,
            max_redirects: 5,
            dns_server: None,
            user_agent: None,
        }
    }
}

impl ProbeSettings {
    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout_secs)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// How load-test requests are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Launch a batch of `concurrency` requests every round interval without
    /// waiting for earlier batches. In-flight requests are unbounded.
    #[default]
    Rounds,
    /// `concurrency` workers each issue requests back to back, so at most
    /// `concurrency` requests are ever in flight.
    WorkerPool,
}

/// Load generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestSettings {
    pub request_timeout_ms: u64,
    pub round_interval_ms: u64,
    pub dispatch: DispatchMode,
    pub user_agent: Option<String>,
}

impl Default for LoadTestSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            round_interval_ms: 100,
            dispatch: DispatchMode::Rounds,
            user_agent: None,
        }
    }
}

impl LoadTestSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_millis(self.round_interval_ms)
    }
}
