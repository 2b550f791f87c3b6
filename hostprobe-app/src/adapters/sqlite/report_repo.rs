//! `ReportRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::error::{AppError, AppResult};
use crate::repository::{
    NewReport, ReportKind, ReportKindFilter, ReportRepository, ReportStatus, StoredReport,
    DEFAULT_HISTORY_LIMIT,
};

use super::entity::report;
use super::SqliteStore;

const KIND_FULL_ANALYSIS: &str = "full_analysis";
const KIND_LOAD_TEST: &str = "load_test";

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::SerializationError(format!("Invalid {field}: {e}")))
}

fn kind_column_value(filter: ReportKindFilter) -> &'static str {
    match filter {
        ReportKindFilter::Analysis => KIND_FULL_ANALYSIS,
        ReportKindFilter::LoadTest => KIND_LOAD_TEST,
    }
}

impl report::Model {
    /// Convert a `SeaORM` row model into a `StoredReport`.
    fn into_stored(self) -> AppResult<StoredReport> {
        let kind = match self.kind.as_str() {
            KIND_FULL_ANALYSIS => ReportKind::FullAnalysis,
            KIND_LOAD_TEST => ReportKind::LoadTest {
                concurrency: self
                    .concurrency
                    .and_then(|c| u32::try_from(c).ok())
                    .ok_or_else(|| {
                        AppError::SerializationError("Invalid concurrency".to_string())
                    })?,
                duration_secs: self
                    .duration_secs
                    .and_then(|d| u64::try_from(d).ok())
                    .ok_or_else(|| {
                        AppError::SerializationError("Invalid duration_secs".to_string())
                    })?,
            },
            other => {
                return Err(AppError::SerializationError(format!(
                    "Unknown report kind: {other}"
                )))
            }
        };

        let port = self
            .port
            .map(u16::try_from)
            .transpose()
            .map_err(|e| AppError::SerializationError(format!("Invalid port: {e}")))?;
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| AppError::SerializationError(format!("Invalid payload JSON: {e}")))?;
        let status = ReportStatus::parse(&self.status).ok_or_else(|| {
            AppError::SerializationError(format!("Invalid status: {}", self.status))
        })?;
        let created_at = parse_timestamp("created_at", &self.created_at)?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(|s| parse_timestamp("completed_at", s))
            .transpose()?;

        Ok(StoredReport {
            id: self.id,
            caller_id: self.caller_id,
            host: self.host,
            port,
            kind,
            payload,
            status,
            created_at,
            completed_at,
        })
    }
}

/// Convert a `StoredReport` into a `SeaORM` active model for insertion.
fn report_to_active_model(report: &StoredReport) -> AppResult<report::ActiveModel> {
    let (kind, concurrency, duration_secs) = match report.kind {
        ReportKind::FullAnalysis => (KIND_FULL_ANALYSIS, None, None),
        ReportKind::LoadTest {
            concurrency,
            duration_secs,
        } => (
            KIND_LOAD_TEST,
            Some(i32::try_from(concurrency).map_err(|e| {
                AppError::SerializationError(format!("Invalid concurrency: {e}"))
            })?),
            Some(i64::try_from(duration_secs).map_err(|e| {
                AppError::SerializationError(format!("Invalid duration_secs: {e}"))
            })?),
        ),
    };
    let payload = serde_json::to_string(&report.payload)
        .map_err(|e| AppError::SerializationError(e.to_string()))?;

    Ok(report::ActiveModel {
        id: Set(report.id.clone()),
        caller_id: Set(report.caller_id.clone()),
        host: Set(report.host.clone()),
        port: Set(report.port.map(i32::from)),
        kind: Set(kind.to_string()),
        concurrency: Set(concurrency),
        duration_secs: Set(duration_secs),
        payload: Set(payload),
        status: Set(report.status.as_str().to_string()),
        created_at: Set(format_timestamp(&report.created_at)),
        completed_at: Set(report.completed_at.as_ref().map(format_timestamp)),
    })
}

#[async_trait]
impl ReportRepository for SqliteStore {
    async fn save(&self, report: NewReport) -> AppResult<StoredReport> {
        let stored = report.into_stored();
        let active_model = report_to_active_model(&stored)?;

        report::Entity::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to save report: {e}")))?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<StoredReport>> {
        let row = report::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to query report: {e}")))?;

        row.map(report::Model::into_stored).transpose()
    }

    async fn find_by_caller(
        &self,
        caller_id: &str,
        kind: Option<ReportKindFilter>,
        limit: Option<usize>,
    ) -> AppResult<Vec<StoredReport>> {
        let mut query =
            report::Entity::find().filter(report::Column::CallerId.eq(caller_id));
        if let Some(filter) = kind {
            query = query.filter(report::Column::Kind.eq(kind_column_value(filter)));
        }

        let limit = u64::try_from(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)).unwrap_or(u64::MAX);
        let rows = query
            .order_by_desc(report::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to query reports: {e}")))?;

        rows.into_iter().map(report::Model::into_stored).collect()
    }

    async fn delete_by_caller(&self, caller_id: &str) -> AppResult<u64> {
        let result = report::Entity::delete_many()
            .filter(report::Column::CallerId.eq(caller_id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete reports: {e}")))?;

        Ok(result.rows_affected)
    }
}
