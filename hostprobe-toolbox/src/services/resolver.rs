//! DNS resolver construction helpers.

use std::net::IpAddr;

use hickory_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    TokioResolver,
};

/// Human-readable description of the DNS servers a configuration points at.
pub(crate) fn describe_nameservers(config: &ResolverConfig) -> String {
    let ips = dedup_ips(config);
    if ips.is_empty() {
        "Default".to_string()
    } else {
        ips.join(", ")
    }
}

/// Deduplicate nameserver IP addresses from a resolver configuration.
pub(crate) fn dedup_ips(config: &ResolverConfig) -> Vec<String> {
    let mut ips: Vec<String> = Vec::new();
    for ns in config.name_servers() {
        let ip = ns.socket_addr.ip().to_string();
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }
    ips
}

/// Build a resolver that targets a specific nameserver IP, or falls back to the
/// system configuration when `ns_ip` is `None`.
///
/// Returns the resolver together with a label describing where it sends queries.
pub(crate) fn build_resolver_for_ns(ns_ip: Option<IpAddr>) -> (TokioResolver, String) {
    if let Some(ns_ip) = ns_ip {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[ns_ip], 53, true),
        );
        let provider = TokioConnectionProvider::default();
        let resolver = TokioResolver::builder_with_config(config, provider)
            .with_options(ResolverOpts::default())
            .build();
        return (resolver, ns_ip.to_string());
    }

    build_system_resolver()
}

/// Build a resolver using the host system DNS configuration (with fallback).
///
/// On Unix/Windows this reads e.g. `/etc/resolv.conf`. If the system
/// configuration cannot be loaded, Hickory's default upstream set is used.
fn build_system_resolver() -> (TokioResolver, String) {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(builder) => {
                let label = hickory_resolver::system_conf::read_system_conf()
                    .map_or_else(|_| "System".to_string(), |(config, _)| describe_nameservers(&config));
                return (builder.build(), label);
            }
            Err(e) => {
                log::warn!(
                    "[DNS] Failed to load system DNS configuration, falling back to defaults: {e}"
                );
            }
        }
    }

    let config = ResolverConfig::default();
    let label = describe_nameservers(&config);
    let provider = TokioConnectionProvider::default();
    let resolver = TokioResolver::builder_with_config(config, provider)
        .with_options(ResolverOpts::default())
        .build();
    (resolver, label)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ips_default_config() {
        let config = ResolverConfig::default();
        let ips = dedup_ips(&config);
        assert!(
            !ips.is_empty(),
            "Default config should have at least one nameserver IP"
        );
    }

    #[test]
    fn test_dedup_ips_empty_config() {
        let config = ResolverConfig::from_parts(None, vec![], NameServerConfigGroup::new());
        assert!(dedup_ips(&config).is_empty());
        assert_eq!(describe_nameservers(&config), "Default");
    }

    #[test]
    fn test_dedup_ips_removes_duplicates() {
        let ip: IpAddr = "1.2.3.4".parse().unwrap();
        let ns_group = NameServerConfigGroup::from_ips_clear(&[ip, ip], 53, true);
        let config = ResolverConfig::from_parts(None, vec![], ns_group);
        assert_eq!(dedup_ips(&config), vec!["1.2.3.4".to_string()]);
    }

    #[tokio::test]
    async fn test_build_resolver_for_ns_with_ip() {
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        let (_resolver, label) = build_resolver_for_ns(Some(ip));
        assert_eq!(label, "8.8.8.8");
    }

    #[tokio::test]
    async fn test_build_resolver_for_ns_without_ip() {
        let (_resolver, label) = build_resolver_for_ns(None);
        assert!(!label.is_empty());
    }
}
