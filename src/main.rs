mod cli;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, OutputFormat};
use driftwatch::{DriftEngine, EngineConfig, output};

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan(args) => {
            let config = match &args.config {
                Some(path) => EngineConfig::from_file(path)?,
                None => EngineConfig::default(),
            };

            let state: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&args.state)?)?;
            let snapshot: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&args.snapshot)?)?;

            let engine = DriftEngine::new(config);
            let report = engine.detect_drift(&state, &snapshot)?;

            tracing::info!(
                items = report.items.len(),
                skipped = report.skipped.len(),
                "drift scan complete"
            );

            match args.output {
                OutputFormat::Table => println!("{}", output::render_table(&report)),
                OutputFormat::Json => println!("{}", output::render_json(&report)?),
            }
        }
    }

    Ok(())
}
