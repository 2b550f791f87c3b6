//! WHOIS lookup module.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::time::timeout;
use whois_rust::{WhoIs, WhoIsLookupOptions};

use crate::error::{ToolboxError, ToolboxResult};
use crate::traits::WhoisSource;
use crate::types::WhoisInfo;

/// WHOIS client speaking the port-43 protocol.
///
/// Starts at `server` (IANA by default) and follows referrals to the
/// registry/registrar responder.
pub struct WhoisClient {
    whois: WhoIs,
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(server: &str, query_timeout: Duration) -> ToolboxResult<Self> {
        let whois = WhoIs::from_host(server).map_err(|e| {
            ToolboxError::NetworkError(format!("Failed to initialize WHOIS client: {e}"))
        })?;
        Ok(Self {
            whois,
            timeout: query_timeout,
        })
    }
}

#[async_trait]
impl WhoisSource for WhoisClient {
    async fn query(&self, domain: &str) -> ToolboxResult<String> {
        let options = WhoIsLookupOptions::from_string(domain)
            .map_err(|e| ToolboxError::ValidationError(format!("Invalid domain: {e}")))?;

        debug!("[WHOIS] Querying {domain}");
        let raw = timeout(self.timeout, self.whois.lookup_async(options))
            .await
            .map_err(|_| {
                warn!("[WHOIS] Query for {domain} timed out ({}s)", self.timeout.as_secs());
                ToolboxError::NetworkError(format!(
                    "WHOIS query timed out ({}s)",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ToolboxError::NetworkError(format!("WHOIS query failed: {e}")))?;

        debug!("[WHOIS] Received {} bytes for {domain}", raw.len());
        Ok(raw)
    }
}

/// Parse raw WHOIS text into a key/value mapping.
///
/// Each line containing a colon is split at the first colon. Keys are trimmed,
/// lower-cased and have whitespace runs replaced by `_`. Lines without a colon
/// or with an empty value are skipped; later duplicates overwrite earlier ones.
pub fn parse_whois_text(raw: &str) -> WhoisInfo {
    let mut info = WhoisInfo::new();

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key = normalize_key(key);
        if key.is_empty() {
            continue;
        }
        info.insert(key, value.to_string());
    }

    info
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
