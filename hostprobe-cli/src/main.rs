//! `hostprobe` command-line entry point.
//!
//! Reports are printed to stdout as pretty JSON; logs go to stderr.

mod commands;
mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use commands::{CommandLine, Commands};
use config::CliConfig;
use hostprobe_app::adapters::{InMemoryReportRepository, SqliteStore};
use hostprobe_app::{AppState, AppStateBuilder, ReportRepository};
use hostprobe_toolbox::{parse_certificate_dump, DispatchMode};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLine::parse_args();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();

    // stdout 只输出报告
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(log_filter(verbose, rust_log.as_deref()))
        .init();
}

/// `RUST_LOG` (or `info`) as the base; `-v`/`-vv` raise it to debug/trace.
fn log_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    let base = rust_log.map_or_else(|| EnvFilter::new("info"), EnvFilter::new);
    match verbose {
        0 => base,
        1 => base.add_directive(tracing::Level::DEBUG.into()),
        _ => base.add_directive(tracing::Level::TRACE.into()),
    }
}

async fn run(cli: CommandLine) -> anyhow::Result<()> {
    let mut config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { host, port } => {
            let state = build_state(&config, cli.no_store).await?;
            let (stored, report) = state.analyze(&cli.caller, &host, port).await?;
            tracing::info!("Analysis of {} stored as {}", stored.host, stored.id);
            print_json(&report)
        }
        Commands::LoadTest {
            host,
            port,
            concurrency,
            duration_secs,
            worker_pool,
        } => {
            if worker_pool {
                config.load_test.dispatch = DispatchMode::WorkerPool;
            }
            let state = build_state(&config, cli.no_store).await?;

            let shutdown = state.shutdown_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, draining in-flight requests...");
                    shutdown.cancel();
                }
            });

            let (stored, report) = state
                .load_test(&cli.caller, &host, port, concurrency, duration_secs)
                .await?;
            tracing::info!("Load test of {} stored as {}", stored.host, stored.id);
            print_json(&report)
        }
        Commands::CertDump { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            print_json(&parse_certificate_dump(&text))
        }
        Commands::History { kind, limit } => {
            let state = build_state(&config, cli.no_store).await?;
            let reports = state
                .history(&cli.caller, kind.map(Into::into), limit)
                .await?;
            print_json(&reports)
        }
    }
}

async fn build_state(config: &CliConfig, no_store: bool) -> anyhow::Result<AppState> {
    let repository: Arc<dyn ReportRepository> = if no_store || !config.storage.enabled {
        tracing::debug!("Report storage disabled, keeping reports in memory");
        Arc::new(InMemoryReportRepository::new())
    } else {
        let path = config.storage.resolved_db_path();
        tracing::debug!("Opening report store at {}", path.display());
        Arc::new(
            SqliteStore::new(&path)
                .await
                .with_context(|| format!("Failed to open report store {}", path.display()))?,
        )
    };

    let state = AppStateBuilder::new()
        .report_repository(repository)
        .probe_settings(config.probe.clone())
        .load_test_settings(config.load_test.clone())
        .build()?;
    Ok(state)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(0, None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_log_filter_respects_rust_log() {
        assert_eq!(
            log_filter(0, Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_log_filter_verbose_raises_level() {
        assert_eq!(
            log_filter(1, Some("warn")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(log_filter(2, None).max_level_hint(), Some(LevelFilter::TRACE));
    }
}
