use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};

use grader::{Grader, GradingTask, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grader=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: grader <config-file>")?;

    let task = GradingTask::from_file(&config_path)?;
    info!("Loaded grading task from {:?}", config_path);

    let settings = Settings::load().context("Failed to load settings")?;
    let summary = Grader::new(settings).run(&task).await?;

    info!("Grading complete: {}", summary);
    Ok(())
}
