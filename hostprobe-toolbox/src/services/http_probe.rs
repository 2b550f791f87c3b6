//! Diagnostic HTTP probe: timing, headers, hosting and security signals.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use reqwest::Client;

use crate::error::{ToolboxError, ToolboxResult};
use crate::settings::ProbeSettings;
use crate::traits::HttpSource;
use crate::types::{HostingGuess, HttpProbeOutcome, SecurityPosture, SpeedSample, Target};

/// Security headers checked, in report order: (header name, label).
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("strict-transport-security", "HSTS"),
    ("content-security-policy", "CSP"),
    ("x-frame-options", "X-Frame-Options"),
    ("x-xss-protection", "X-XSS-Protection"),
    ("x-content-type-options", "X-Content-Type-Options"),
];

/// Body markers scanned for technology detection (case-sensitive).
const TECHNOLOGY_MARKERS: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("_next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue.js"),
    ("angular", "Angular"),
];

/// Build the URL probed for a target.
///
/// `https` when the port is 443 or unspecified, `http` otherwise. The port is
/// only spelled out when it is neither 80 nor 443.
pub fn build_probe_url(target: &Target) -> String {
    let scheme = match target.port {
        None | Some(443) => "https",
        Some(_) => "http",
    };
    match target.port {
        Some(port) if port != 80 && port != 443 => {
            format!("{scheme}://{}:{port}", target.host)
        }
        _ => format!("{scheme}://{}", target.host),
    }
}

/// Single-request HTTP prober.
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(settings: &ProbeSettings) -> ToolboxResult<Self> {
        let mut builder = Client::builder()
            .timeout(settings.http_timeout())
            .connect_timeout(settings.http_timeout())
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects));
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder
            .build()
            .map_err(|e| ToolboxError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> ToolboxResult<HttpProbeOutcome> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("HTTP request failed: {e}")))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("Failed to read response body: {e}")))?;

        let response_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        #[allow(clippy::cast_precision_loss)]
        let download_bytes_per_sec = (!body.is_empty() && response_time_ms > 0.0)
            .then(|| body.len() as f64 / response_time_ms * 1000.0);

        let body_text = String::from_utf8_lossy(&body);
        let hosting = HostingGuess {
            server: header_value(&headers, "server").map(str::to_string),
            provider: Some(detect_hosting_provider(&headers)),
            technologies: detect_technologies(&headers, &body_text),
        };
        let security = security_posture(&headers);

        debug!(
            "[HTTP] Probe completed: {url} - status={status_code}, headers={}, bytes={}, time={response_time_ms:.1}ms",
            headers.len(),
            body.len()
        );

        Ok(HttpProbeOutcome {
            headers,
            status_code: Some(status_code),
            final_url: Some(final_url),
            speed: SpeedSample {
                response_time_ms,
                ttfb_ms: response_time_ms,
                download_bytes_per_sec,
            },
            hosting,
            security,
        })
    }
}

#[async_trait]
impl HttpSource for HttpProber {
    async fn probe(&self, target: &Target) -> HttpProbeOutcome {
        let url = build_probe_url(target);
        debug!("[HTTP] Probing {url}");
        match self.fetch(&url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[HTTP] {url}: {e}");
                HttpProbeOutcome::failed()
            }
        }
    }
}

/// Lower-case header names; repeated headers are joined with `", "`.
fn collect_headers(map: &HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).to_string();
        headers
            .entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}

/// Case-insensitive header lookup.
fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Derive the security posture from header presence.
pub fn security_posture(headers: &BTreeMap<String, String>) -> SecurityPosture {
    let mut posture = SecurityPosture::default();
    for &(name, label) in SECURITY_HEADERS {
        if header_value(headers, name).is_none() {
            continue;
        }
        match name {
            "strict-transport-security" => posture.hsts = true,
            "content-security-policy" => posture.csp = true,
            "x-frame-options" => posture.x_frame = true,
            _ => {}
        }
        posture.security_headers.push(label.to_string());
    }
    posture
}

/// Guess the hosting provider; the first matching rule wins.
pub fn detect_hosting_provider(headers: &BTreeMap<String, String>) -> String {
    let server = header_value(headers, "server")
        .map(str::to_lowercase)
        .unwrap_or_default();
    let powered_by = header_value(headers, "x-powered-by")
        .map(str::to_lowercase)
        .unwrap_or_default();

    let provider = if server.contains("cloudflare") {
        "Cloudflare"
    } else if server.contains("nginx") {
        "Nginx"
    } else if server.contains("apache") {
        "Apache"
    } else if powered_by.contains("aws") {
        "AWS"
    } else if header_value(headers, "x-amz-cf-id").is_some() {
        "AWS CloudFront"
    } else if header_value(headers, "x-served-by").is_some() {
        "Fastly"
    } else {
        "Unknown"
    };
    provider.to_string()
}

/// Body markers in fixed order, then the raw `X-Powered-By` value.
pub fn detect_technologies(headers: &BTreeMap<String, String>, body: &str) -> Vec<String> {
    let mut technologies: Vec<String> = TECHNOLOGY_MARKERS
        .iter()
        .filter(|(marker, _)| body.contains(marker))
        .map(|(_, label)| (*label).to_string())
        .collect();

    if let Some(powered_by) = header_value(headers, "x-powered-by") {
        if !technologies.iter().any(|t| t == powered_by) {
            technologies.push(powered_by.to_string());
        }
    }
    technologies
}
