//! Report persistence abstraction.
//!
//! Reports are stored as opaque JSON documents keyed by caller identity, target
//! and report kind. The toolbox never touches storage; the application layer
//! hands finished reports to a [`ReportRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Number of reports returned by history queries when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// What produced a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportKind {
    /// Full DNS/WHOIS/TLS/HTTP analysis.
    FullAnalysis,
    /// Load test run with its parameters.
    LoadTest { concurrency: u32, duration_secs: u64 },
}

impl ReportKind {
    pub fn matches(&self, filter: ReportKindFilter) -> bool {
        matches!(
            (self, filter),
            (Self::FullAnalysis, ReportKindFilter::Analysis)
                | (Self::LoadTest { .. }, ReportKindFilter::LoadTest)
        )
    }
}

/// History filter on the report kind, ignoring load-test parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKindFilter {
    Analysis,
    LoadTest,
}

/// Report status. Reports are stored once their run has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Completed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A report about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub caller_id: String,
    pub host: String,
    pub port: Option<u16>,
    pub kind: ReportKind,
    pub payload: serde_json::Value,
    pub status: ReportStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewReport {
    /// Assign an id and creation time.
    pub fn into_stored(self) -> StoredReport {
        StoredReport {
            id: uuid::Uuid::new_v4().to_string(),
            caller_id: self.caller_id,
            host: self.host,
            port: self.port,
            kind: self.kind,
            payload: self.payload,
            status: self.status,
            created_at: Utc::now(),
            completed_at: self.completed_at,
        }
    }
}

/// A persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: String,
    pub caller_id: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub kind: ReportKind,
    pub payload: serde_json::Value,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Report storage.
///
/// Implementations must return history newest first.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persist a report and return it with its assigned id.
    async fn save(&self, report: NewReport) -> AppResult<StoredReport>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<StoredReport>>;

    /// Reports of one caller, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_HISTORY_LIMIT`].
    async fn find_by_caller(
        &self,
        caller_id: &str,
        kind: Option<ReportKindFilter>,
        limit: Option<usize>,
    ) -> AppResult<Vec<StoredReport>>;

    /// Delete every report of a caller, returning how many were removed.
    async fn delete_by_caller(&self, caller_id: &str) -> AppResult<u64>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_serialization() {
        let kind = ReportKind::LoadTest {
            concurrency: 10,
            duration_secs: 30,
        };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "load_test", "concurrency": 10, "duration_secs": 30})
        );
        let back: ReportKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_report_kind_matches_filter() {
        assert!(ReportKind::FullAnalysis.matches(ReportKindFilter::Analysis));
        assert!(!ReportKind::FullAnalysis.matches(ReportKindFilter::LoadTest));
        let load = ReportKind::LoadTest {
            concurrency: 1,
            duration_secs: 5,
        };
        assert!(load.matches(ReportKindFilter::LoadTest));
        assert!(!load.matches(ReportKindFilter::Analysis));
    }

    #[test]
    fn test_report_status_round_trip() {
        assert_eq!(
            ReportStatus::parse(ReportStatus::Completed.as_str()),
            Some(ReportStatus::Completed)
        );
        assert_eq!(ReportStatus::parse("running"), None);
        assert_eq!(ReportStatus::parse("unknown"), None);
    }

    #[test]
    fn test_into_stored_assigns_unique_ids() {
        let new = NewReport {
            caller_id: "local".to_string(),
            host: "example.com".to_string(),
            port: None,
            kind: ReportKind::FullAnalysis,
            payload: serde_json::json!({}),
            status: ReportStatus::Completed,
            completed_at: None,
        };
        let a = new.clone().into_stored();
        let b = new.into_stored();
        assert_ne!(a.id, b.id);
        assert_eq!(a.caller_id, "local");
    }
}
