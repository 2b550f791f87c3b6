//! DNS 查询模块
//!
//! Resolves A, AAAA, MX, NS, TXT, CNAME and SOA as independent lookups. A failed
//! type degrades to an absent field; it never aborts the others.

use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioResolver;
use log::{debug, trace};

use super::resolver::build_resolver_for_ns;
use crate::error::{ToolboxError, ToolboxResult};
use crate::traits::DnsBackend;
use crate::types::{DnsRecordSet, MxRecord, SoaRecord};

/// [`DnsBackend`] backed by a Hickory resolver.
pub struct HickoryDnsBackend {
    resolver: TokioResolver,
    nameserver: String,
}

impl HickoryDnsBackend {
    /// Resolver using the system DNS configuration.
    pub fn system() -> Self {
        Self::with_nameserver(None)
    }

    /// Resolver sending every query to `ns_ip`, or the system configuration when `None`.
    pub fn with_nameserver(ns_ip: Option<IpAddr>) -> Self {
        let (resolver, nameserver) = build_resolver_for_ns(ns_ip);
        Self {
            resolver,
            nameserver,
        }
    }

    /// Label of the nameserver(s) queries are sent to.
    pub fn nameserver(&self) -> &str {
        &self.nameserver
    }
}

fn lookup_error(kind: &str, host: &str, e: impl std::fmt::Display) -> ToolboxError {
    ToolboxError::NetworkError(format!("{kind} lookup for {host} failed: {e}"))
}

fn trim_name(name: impl ToString) -> String {
    name.to_string().trim_end_matches('.').to_string()
}

#[async_trait]
impl DnsBackend for HickoryDnsBackend {
    async fn lookup_a(&self, host: &str) -> ToolboxResult<Vec<String>> {
        let response = self
            .resolver
            .ipv4_lookup(host)
            .await
            .map_err(|e| lookup_error("A", host, e))?;
        Ok(response.iter().map(ToString::to_string).collect())
    }

    async fn lookup_aaaa(&self, host: &str) -> ToolboxResult<Vec<String>> {
        let response = self
            .resolver
            .ipv6_lookup(host)
            .await
            .map_err(|e| lookup_error("AAAA", host, e))?;
        Ok(response.iter().map(ToString::to_string).collect())
    }

    async fn lookup_mx(&self, host: &str) -> ToolboxResult<Vec<MxRecord>> {
        let response = self
            .resolver
            .mx_lookup(host)
            .await
            .map_err(|e| lookup_error("MX", host, e))?;
        Ok(response
            .iter()
            .map(|mx| MxRecord {
                exchange: trim_name(mx.exchange()),
                priority: mx.preference(),
            })
            .collect())
    }

    async fn lookup_ns(&self, host: &str) -> ToolboxResult<Vec<String>> {
        let response = self
            .resolver
            .ns_lookup(host)
            .await
            .map_err(|e| lookup_error("NS", host, e))?;
        Ok(response.iter().map(trim_name).collect())
    }

    async fn lookup_txt(&self, host: &str) -> ToolboxResult<Vec<Vec<String>>> {
        let response = self
            .resolver
            .txt_lookup(host)
            .await
            .map_err(|e| lookup_error("TXT", host, e))?;
        Ok(response
            .iter()
            .map(|txt| {
                txt.iter()
                    .map(|data| String::from_utf8_lossy(data).to_string())
                    .collect()
            })
            .collect())
    }

    async fn lookup_cname(&self, host: &str) -> ToolboxResult<Vec<String>> {
        let response = self
            .resolver
            .lookup(host, RecordType::CNAME)
            .await
            .map_err(|e| lookup_error("CNAME", host, e))?;
        Ok(response
            .record_iter()
            .filter_map(|record| record.data().as_cname().map(|cname| trim_name(&cname.0)))
            .collect())
    }

    async fn lookup_soa(&self, host: &str) -> ToolboxResult<SoaRecord> {
        let response = self
            .resolver
            .soa_lookup(host)
            .await
            .map_err(|e| lookup_error("SOA", host, e))?;
        let soa = response
            .iter()
            .next()
            .ok_or_else(|| ToolboxError::NetworkError(format!("No SOA record for {host}")))?;
        Ok(SoaRecord {
            nsname: trim_name(soa.mname()),
            hostmaster: trim_name(soa.rname()),
            serial: soa.serial(),
            refresh: soa.refresh(),
            retry: soa.retry(),
            expire: soa.expire(),
            minttl: soa.minimum(),
        })
    }
}

/// Keep a successful, non-empty answer; anything else becomes absent.
fn settle<T>(kind: &str, host: &str, result: ToolboxResult<Vec<T>>) -> Option<Vec<T>> {
    match result {
        Ok(values) if !values.is_empty() => Some(values),
        Ok(_) => {
            trace!("[DNS] {kind} lookup for {host} returned no records");
            None
        }
        Err(e) => {
            debug!("[DNS] {e}");
            None
        }
    }
}

/// Resolve every supported record type for `host` concurrently.
pub async fn resolve_records(backend: &dyn DnsBackend, host: &str) -> DnsRecordSet {
    let (a, aaaa, mx, ns, txt, cname, soa) = tokio::join!(
        backend.lookup_a(host),
        backend.lookup_aaaa(host),
        backend.lookup_mx(host),
        backend.lookup_ns(host),
        backend.lookup_txt(host),
        backend.lookup_cname(host),
        backend.lookup_soa(host),
    );

    let soa = match soa {
        Ok(soa) => Some(soa),
        Err(e) => {
            debug!("[DNS] {e}");
            None
        }
    };

    DnsRecordSet {
        a: settle("A", host, a),
        aaaa: settle("AAAA", host, aaaa),
        mx: settle("MX", host, mx),
        ns: settle("NS", host, ns),
        txt: settle("TXT", host, txt),
        cname: settle("CNAME", host, cname),
        soa,
    }
}
