//! In-memory `ReportRepository`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::repository::{
    NewReport, ReportKindFilter, ReportRepository, StoredReport, DEFAULT_HISTORY_LIMIT,
};

/// Report repository kept in process memory.
///
/// Default implementation, used when persistence is disabled.
#[derive(Clone, Default)]
pub struct InMemoryReportRepository {
    reports: Arc<RwLock<Vec<StoredReport>>>,
}

impl InMemoryReportRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn save(&self, report: NewReport) -> AppResult<StoredReport> {
        let stored = report.into_stored();
        self.reports.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<StoredReport>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_by_caller(
        &self,
        caller_id: &str,
        kind: Option<ReportKindFilter>,
        limit: Option<usize>,
    ) -> AppResult<Vec<StoredReport>> {
        let reports = self.reports.read().await;
        // Reverse insertion order first so equal timestamps stay newest first
        let mut matching: Vec<StoredReport> = reports
            .iter()
            .rev()
            .filter(|r| r.caller_id == caller_id)
            .filter(|r| kind.is_none_or(|filter| r.kind.matches(filter)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        Ok(matching)
    }

    async fn delete_by_caller(&self, caller_id: &str) -> AppResult<u64> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.caller_id != caller_id);
        Ok((before - reports.len()) as u64)
    }
}
