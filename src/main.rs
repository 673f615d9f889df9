use clap::Parser;
use marquee::cli::{Args, Command};
use marquee::config::Config;
use marquee::logging::setup_logging;
use marquee::pipeline::Pipeline;
use marquee::utils::fmt_duration;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging needs the config, so a bad config can only go to stderr
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        staging_dir = %config.staging_dir.display(),
        "starting marquee"
    );

    let start = Instant::now();
    match run(config, args.command).await {
        Ok(()) => {
            info!(duration = fmt_duration(start.elapsed()), "Finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    let render_delay = config.render_delay;
    let pipeline = Pipeline::new(config);

    match command {
        Command::Oscars { delay } => {
            pipeline.run_oscars(delay.unwrap_or(render_delay)).await?;
        }
        Command::Bechdel => {
            pipeline.run_bechdel().await?;
        }
        Command::Imdb {
            chunk_size,
            datasets,
        } => {
            pipeline.run_imdb(&datasets, chunk_size).await?;
        }
        Command::All => pipeline.run_all().await?,
        Command::Seed { dir } => pipeline.run_seeded(&dir).await?,
        Command::Extract { input, stdout } => {
            let rows = pipeline.extract_file(&input, stdout)?;
            info!(rows, input = %input.display(), "Extracted award rows");
        }
    }
    Ok(())
}
