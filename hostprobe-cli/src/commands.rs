use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hostprobe_app::ReportKindFilter;

#[derive(Parser)]
#[command(name = "hostprobe", version)]
#[command(about = "Host diagnostics and HTTP load testing.")]
pub struct CommandLine {
    /// Caller id the stored reports are filed under
    #[arg(long, global = true, default_value = "local")]
    pub caller: String,

    /// Config file (defaults to <config dir>/hostprobe/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep reports in memory only
    #[arg(long, global = true)]
    pub no_store: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run DNS, WHOIS, TLS and HTTP probes against a host
    #[command(alias = "a")]
    Analyze {
        host: String,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate concurrent HTTP load against a host
    #[command(alias = "l")]
    LoadTest {
        host: String,
        #[arg(short, long)]
        port: Option<u16>,
        /// Requests launched per round (1-100)
        #[arg(short, long, default_value_t = 10)]
        concurrency: u32,
        /// Test duration in seconds (5-300)
        #[arg(short, long = "duration", default_value_t = 30)]
        duration_secs: u64,
        /// Cap in-flight requests at the concurrency level
        #[arg(long)]
        worker_pool: bool,
    },
    /// Parse an `openssl x509 -text` dump
    CertDump { file: PathBuf },
    /// List stored reports, newest first
    #[command(alias = "h")]
    History {
        #[arg(long, value_enum)]
        kind: Option<HistoryKind>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HistoryKind {
    Analysis,
    LoadTest,
}

impl From<HistoryKind> for ReportKindFilter {
    fn from(kind: HistoryKind) -> Self {
        match kind {
            HistoryKind::Analysis => Self::Analysis,
            HistoryKind::LoadTest => Self::LoadTest,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
