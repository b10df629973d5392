use clap::Parser;
use taskdeck::cli::commands::Cli;
use taskdeck::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (EnvFilter syntax)
const LOG_ENV: &str = "TASKDECK_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
