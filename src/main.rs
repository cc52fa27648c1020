use clap::Parser;
use photo_fetcher::{
    load_config, run_worker, setup_logging, setup_worker_logging, validate_photo_count, Cli,
    CliRunner, Commands,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    if let Some(Commands::Worker) = args.command {
        setup_worker_logging(args.log_level)?;
        if let Err(e) = run_worker().await {
            error!("Worker failed: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    setup_logging(args.log_level, args.log_file.as_deref())?;

    info!("Starting photo-fetcher v{}", env!("CARGO_PKG_VERSION"));

    // Reject bad counts before any client is built or request is sent
    let requested = match args.photos.map(validate_photo_count).transpose() {
        Ok(requested) => requested,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let Some(mode) = args.mode else {
        error!("--mode is required");
        std::process::exit(1);
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let cli_runner = CliRunner::new(config, args.log_level)?;

    // Dropping the run future on interrupt kills any worker processes
    let result = tokio::select! {
        result = cli_runner.run(mode, requested) => Some(result),
        _ = signal::ctrl_c() => None,
    };

    match result {
        Some(Ok(report)) => {
            report.log_summary();
            info!("photo-fetcher stopped");
        }
        Some(Err(e)) => {
            error!("Application error: {:#}", e);
            std::process::exit(1);
        }
        None => info!("Process interrupted by user"),
    }

    Ok(())
}
