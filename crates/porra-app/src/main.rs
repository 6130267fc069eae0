// Prediction pool entry point.
//
// Startup sequence:
// 1. Parse command line
// 2. Initialize tracing (stderr, so stdout carries only reports)
// 3. Load config (copying defaults on first run)
// 4. Load dataset and shared overrides, open the local database
// 5. Run the command

use porra_app::app::AppState;
use porra_app::cli::Cli;
use porra_app::config;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse command line
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;

    // 3. Load config
    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: pool={}, storage_key={}",
        config.pool.name, config.pool.storage_key
    );

    // 4. Build application state
    let mut app = AppState::start(config).await?;

    // 5. Run the command
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = app.handle(&cli.command, cli.format, &mut out) {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Initialize tracing to stderr.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("porra_app=info,porra_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
