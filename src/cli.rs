use crate::{
    serve_worker, BatchOutcome, Comparison, ComparisonHarness, Config, ExecutionStrategy,
    PhotoFetcher, ProcessPool, ProcessPoolStrategy, SequentialStrategy, Strategy,
    ThreadPoolStrategy,
};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "photo-fetcher")]
#[command(about = "Fetch photo and album data from the API with interchangeable execution modes")]
#[command(version = "0.1.0")]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, value_enum, required = true, help = "Execution mode to use")]
    pub mode: Option<Mode>,

    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Number of photos to process (default: all)"
    )]
    pub photos: Option<i64>,

    #[arg(
        long,
        value_enum,
        default_value = "INFO",
        ignore_case = true,
        help = "Log detail level"
    )]
    pub log_level: LogLevel,

    #[arg(long, help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Base URL of the photo API")]
    pub base_url: Option<String>,

    #[arg(long, help = "Maximum concurrent workers")]
    pub max_concurrent: Option<usize>,

    #[arg(long, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve one process pool job over stdin/stdout
    #[command(hide = true)]
    Worker,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Threads,
    Processes,
    Compare,
}

impl Mode {
    /// The single strategy this mode runs, `None` for compare
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Mode::Sequential => Some(Strategy::Sequential),
            Mode::Threads => Some(Strategy::Threads),
            Mode::Processes => Some(Strategy::Processes),
            Mode::Compare => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    pub fn to_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// Spelling accepted by `--log-level`
    pub fn as_arg(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Defaults, then the optional JSON file, then command-line overrides
pub fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?
    } else {
        Config::default()
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    info!("API base URL: {}", config.base_url);
    info!("Max concurrent workers: {}", config.max_concurrent);
    info!("Request timeout: {:?}", config.request_timeout);

    Ok(config)
}

#[derive(Debug, Clone)]
pub enum RunReport {
    Batch(BatchOutcome),
    Comparison(Comparison),
}

impl RunReport {
    pub fn log_summary(&self) {
        match self {
            RunReport::Batch(outcome) => {
                let summary = outcome.summary();
                info!(
                    "Process completed: {} ok, {} errors",
                    summary.succeeded, summary.failed
                );
                info!("Total time: {:.2} seconds", outcome.elapsed.as_secs_f64());
            }
            RunReport::Comparison(comparison) => comparison.log_report(),
        }
    }
}

pub struct CliRunner {
    pub config: Config,
    log_level: LogLevel,
    fetcher: Arc<PhotoFetcher>,
}

impl CliRunner {
    pub fn new(config: Config, log_level: LogLevel) -> anyhow::Result<Self> {
        let fetcher = Arc::new(PhotoFetcher::new(config.clone())?);

        Ok(Self {
            config,
            log_level,
            fetcher,
        })
    }

    pub fn strategy(&self, kind: Strategy) -> anyhow::Result<Box<dyn ExecutionStrategy>> {
        let strategy: Box<dyn ExecutionStrategy> = match kind {
            Strategy::Sequential => Box::new(SequentialStrategy::new(self.fetcher.clone())),
            Strategy::Threads => Box::new(ThreadPoolStrategy::new(self.fetcher.clone())),
            Strategy::Processes => {
                let pool = ProcessPool::new(self.config.clone())?.log_level(self.log_level);
                Box::new(ProcessPoolStrategy::new(pool))
            }
        };
        Ok(strategy)
    }

    /// Requested count, or whatever the API currently lists
    pub async fn resolve_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(count) => count,
            None => self.fetcher.discover_total_count().await,
        }
    }

    pub async fn run(&self, mode: Mode, requested: Option<usize>) -> anyhow::Result<RunReport> {
        let limit = self.resolve_limit(requested).await;

        match mode.strategy() {
            Some(kind) => {
                let outcome = self.strategy(kind)?.run(limit).await;
                Ok(RunReport::Batch(outcome))
            }
            None => {
                let limit = limit.min(self.config.compare_limit);
                let strategies = Strategy::ALL
                    .iter()
                    .map(|&kind| self.strategy(kind))
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let harness = ComparisonHarness::new(strategies, self.config.compare_cooldown);
                Ok(RunReport::Comparison(harness.compare(limit).await))
            }
        }
    }
}

/// Entry point of the hidden `worker` subcommand
pub async fn run_worker() -> anyhow::Result<usize> {
    let written = serve_worker(tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(written)
}

pub fn setup_logging(level: LogLevel, log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level.to_level()))
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Worker processes keep stdout for results, so they log to stderr
pub fn setup_worker_logging(level: LogLevel) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level.to_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_required() {
        assert!(Cli::try_parse_from(["photo-fetcher"]).is_err());
        assert!(Cli::try_parse_from(["photo-fetcher", "--mode", "parallel"]).is_err());
    }

    #[test]
    fn test_parse_batch_arguments() {
        let cli = Cli::try_parse_from([
            "photo-fetcher",
            "--mode",
            "threads",
            "--photos",
            "75",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        assert_eq!(cli.mode, Some(Mode::Threads));
        assert_eq!(cli.photos, Some(75));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_negative_photo_count_reaches_validation() {
        let cli = Cli::try_parse_from(["photo-fetcher", "--mode", "sequential", "--photos", "-5"])
            .unwrap();
        assert_eq!(cli.photos, Some(-5));
        assert!(crate::validate_photo_count(cli.photos.unwrap()).is_err());
    }

    #[test]
    fn test_log_level_defaults_and_ignores_case() {
        let cli = Cli::try_parse_from(["photo-fetcher", "--mode", "compare"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);

        let cli = Cli::try_parse_from(["photo-fetcher", "--mode", "compare", "--log-level", "warning"])
            .unwrap();
        assert_eq!(cli.log_level, LogLevel::Warning);
        assert_eq!(cli.log_level.to_level(), tracing::Level::WARN);
        assert_eq!(cli.log_level.as_arg(), "WARNING");
    }

    #[test]
    fn test_worker_subcommand_needs_no_mode() {
        let cli = Cli::try_parse_from(["photo-fetcher", "--log-level", "ERROR", "worker"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Worker));
        assert!(cli.mode.is_none());
    }

    #[test]
    fn test_mode_strategy_mapping() {
        assert_eq!(Mode::Sequential.strategy(), Some(Strategy::Sequential));
        assert_eq!(Mode::Threads.strategy(), Some(Strategy::Threads));
        assert_eq!(Mode::Processes.strategy(), Some(Strategy::Processes));
        assert_eq!(Mode::Compare.strategy(), None);
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let cli = Cli::try_parse_from([
            "photo-fetcher",
            "--mode",
            "sequential",
            "--base-url",
            "http://127.0.0.1:9000/",
            "--max-concurrent",
            "8",
            "--timeout",
            "3",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.photo_url(1), "http://127.0.0.1:9000/photos/1");
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.default_photo_count, 5000);
    }

    #[test]
    fn test_load_config_rejects_invalid_overrides() {
        let cli = Cli::try_parse_from(["photo-fetcher", "--mode", "threads", "--max-concurrent", "0"])
            .unwrap();
        assert!(load_config(&cli).is_err());

        let cli = Cli::try_parse_from(["photo-fetcher", "--mode", "threads", "--base-url", "ftp://x"])
            .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
