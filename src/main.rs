//! Command-line front end for the bundled flat Monte-Carlo integrator.
//!
//! Reads a module graph (JSON, shaped like [`momemta::configuration::TopLevelConfig`])
//! and an event (JSON, a list of [`momemta::lorentz::Particle`] plus optional
//! missing transverse energy), builds a `Plan`, and prints the integrated
//! weight(s). Replaces the original command-line driver's role
//! (`examples/original_source/include/MEMpp.h`'s `computeWeights` entry
//! point) with a single binary instead of per-analysis C++ executables.

use clap::Parser;
use momemta::configuration::TopLevelConfig;
use momemta::lorentz::{LorentzVector, Particle};
use momemta::{EngineConfig, Momemta};
use std::path::PathBuf;
use std::process::ExitCode;

/// An event as read from the `--event` JSON file.
#[derive(Debug, serde::Deserialize)]
struct EventFile {
    particles: Vec<Particle>,
    #[serde(default)]
    met: Option<LorentzVector>,
}

#[derive(Parser, Debug)]
#[command(name = "momemta", version, about = "Matrix Element Method weight computation")]
struct Cli {
    /// Path to the module graph configuration (JSON).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Path to the event to evaluate (JSON: `{"particles": [...], "met": ...}`).
    #[arg(long, value_name = "FILE")]
    event: PathBuf,

    /// Path to the engine configuration (TOML); falls back to the
    /// `momemta.toml`/`momemta.local.toml`/`MOMEMTA_*` hierarchy when unset.
    #[arg(long, value_name = "FILE")]
    engine_config: Option<PathBuf>,

    /// Dynamic matrix-element plugin(s) to load before building the plan.
    #[arg(long = "plugin", value_name = "FILE")]
    plugins: Vec<PathBuf>,

    /// Override the configured log level (e.g. `debug`, `warn`).
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(engine_config: &EngineConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&engine_config.logging.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if engine_config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let engine_config = match &cli.engine_config {
        Some(path) => EngineConfig::from_file(path.to_string_lossy().as_ref())?,
        None => EngineConfig::load()?,
    };

    init_tracing(&engine_config, cli.log_level.as_deref());

    let momemta = Momemta::new(engine_config);
    for plugin in &cli.plugins {
        momemta.load_plugin(plugin)?;
        tracing::info!(path = %plugin.display(), "loaded plugin");
    }

    let config_text = std::fs::read_to_string(&cli.config)?;
    let config: TopLevelConfig = serde_json::from_str(&config_text)?;

    let event_text = std::fs::read_to_string(&cli.event)?;
    let event: EventFile = serde_json::from_str(&event_text)?;

    let weights = momemta.compute_weights(&config, &event.particles, event.met)?;
    for (i, weight) in weights.iter().enumerate() {
        println!("integrand[{i}] = {:e} +/- {:e}", weight.value, weight.error);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
