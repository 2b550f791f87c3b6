//! Application layer for hostprobe.
//!
//! Provides `AppState` (validated entry points that run the toolbox and persist
//! the results) and `AppStateBuilder` (adapter injection). Frontends construct
//! `AppState` once at startup.

pub mod adapters;
mod error;
mod repository;

use std::sync::Arc;

use hostprobe_toolbox::{
    validate_load_test, validate_target, DomainReport, LoadGenerator, LoadTestReport,
    LoadTestSettings, ProbeSettings, ReportComposer, Target,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use error::{AppError, AppResult};
pub use repository::{
    NewReport, ReportKind, ReportKindFilter, ReportRepository, ReportStatus, StoredReport,
    DEFAULT_HISTORY_LIMIT,
};

/// Platform-agnostic application state.
pub struct AppState {
    repository: Arc<dyn ReportRepository>,
    composer: ReportComposer,
    load_test_settings: LoadTestSettings,
    shutdown: CancellationToken,
}

impl AppState {
    /// Validate the target, run the full analysis and store the report.
    ///
    /// Invalid input fails before any probe runs. Probe failures never fail the
    /// call; a storage failure does, after the analysis completed.
    pub async fn analyze(
        &self,
        caller_id: &str,
        host: &str,
        port: Option<u16>,
    ) -> AppResult<(StoredReport, DomainReport)> {
        let target = validate_target(host, port)?;
        let report = self.composer.analyze(&target).await;

        let stored = self
            .store(caller_id, &target, ReportKind::FullAnalysis, &report, None)
            .await?;
        Ok((stored, report))
    }

    /// Validate the parameters, run a load test and store the report.
    ///
    /// The run stops launching requests early when the state's shutdown token
    /// is cancelled.
    pub async fn load_test(
        &self,
        caller_id: &str,
        host: &str,
        port: Option<u16>,
        concurrency: u32,
        duration_secs: u64,
    ) -> AppResult<(StoredReport, LoadTestReport)> {
        let target = validate_target(host, port)?;
        let duration = validate_load_test(concurrency, duration_secs)?;

        let generator = LoadGenerator::new(self.load_test_settings.clone())?
            .with_cancellation(self.shutdown.child_token());
        let report = generator.run(&target, concurrency, duration).await;

        let kind = ReportKind::LoadTest {
            concurrency,
            duration_secs,
        };
        let stored = self
            .store(caller_id, &target, kind, &report, Some(chrono::Utc::now()))
            .await?;
        Ok((stored, report))
    }

    /// A caller's stored reports, newest first.
    pub async fn history(
        &self,
        caller_id: &str,
        kind: Option<ReportKindFilter>,
        limit: Option<usize>,
    ) -> AppResult<Vec<StoredReport>> {
        self.repository.find_by_caller(caller_id, kind, limit).await
    }

    /// Fetch one stored report.
    pub async fn report(&self, id: &str) -> AppResult<StoredReport> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Token cancelling in-flight load tests.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    async fn store<T: Serialize>(
        &self,
        caller_id: &str,
        target: &Target,
        kind: ReportKind,
        report: &T,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> AppResult<StoredReport> {
        let payload = serde_json::to_value(report)
            .map_err(|e| AppError::SerializationError(e.to_string()))?;

        let new_report = NewReport {
            caller_id: caller_id.to_string(),
            host: target.host.clone(),
            port: target.port,
            kind,
            payload,
            status: ReportStatus::Completed,
            completed_at,
        };

        match self.repository.save(new_report).await {
            Ok(stored) => {
                log::debug!("Stored report {} for {caller_id} ({target})", stored.id);
                Ok(stored)
            }
            Err(e) => {
                log::error!("Failed to store report for {caller_id} ({target}): {e}");
                Err(e)
            }
        }
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `report_repository`: where reports are stored
///
/// # Optional
/// - `composer`: defaults to the network clients built from `probe_settings`
/// - `probe_settings` / `load_test_settings`: default values
/// - `shutdown_token`: defaults to a fresh token
pub struct AppStateBuilder {
    report_repository: Option<Arc<dyn ReportRepository>>,
    composer: Option<ReportComposer>,
    probe_settings: ProbeSettings,
    load_test_settings: LoadTestSettings,
    shutdown: Option<CancellationToken>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            report_repository: None,
            composer: None,
            probe_settings: ProbeSettings::default(),
            load_test_settings: LoadTestSettings::default(),
            shutdown: None,
        }
    }

    #[must_use]
    pub fn report_repository(mut self, repo: Arc<dyn ReportRepository>) -> Self {
        self.report_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn composer(mut self, composer: ReportComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    #[must_use]
    pub fn probe_settings(mut self, settings: ProbeSettings) -> Self {
        self.probe_settings = settings;
        self
    }

    #[must_use]
    pub fn load_test_settings(mut self, settings: LoadTestSettings) -> Self {
        self.load_test_settings = settings;
        self
    }

    #[must_use]
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `AppError::ValidationError` if required adapters are missing, or
    /// the toolbox error if the default composer cannot be built from the settings.
    pub fn build(self) -> AppResult<AppState> {
        let repository = self.report_repository.ok_or_else(|| {
            AppError::ValidationError("report_repository is required".to_string())
        })?;
        let composer = match self.composer {
            Some(composer) => composer,
            None => ReportComposer::from_settings(&self.probe_settings)?,
        };

        Ok(AppState {
            repository,
            composer,
            load_test_settings: self.load_test_settings,
            shutdown: self.shutdown.unwrap_or_default(),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
