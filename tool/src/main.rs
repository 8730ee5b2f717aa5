use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AnalysisConfig;

mod cmd;
mod config;
mod plot;

/// Extrusion-weighted center of mass of a single G-code layer
#[derive(Parser, Debug)]
#[clap(version = env!("TOOL_VERSION"))]
pub struct Opts {
    #[clap(long = "config_file", parse(from_os_str))]
    config_filename: Option<PathBuf>,

    /// Log more; repeat for trace output. RUST_LOG applies otherwise
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbose: u8,

    #[clap(subcommand)]
    cmd: SubCommand,

    #[clap(skip)]
    config: OnceCell<AnalysisConfig>,
}

impl Opts {
    fn config(&self) -> Result<&AnalysisConfig> {
        self.config.get_or_try_init(|| self.load_config())
    }

    fn load_config(&self) -> Result<AnalysisConfig> {
        let filename = match &self.config_filename {
            Some(filename) => filename,
            None => return Ok(AnalysisConfig::default()),
        };

        let src = std::fs::read_to_string(filename)
            .with_context(|| format!("reading config file {}", filename.display()))?;
        let config = AnalysisConfig::from_hjson(&src)
            .with_context(|| format!("parsing config file {}", filename.display()))?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }
}

#[derive(Parser, Debug)]
enum SubCommand {
    Analyze(cmd::analyze::AnalyzeCmd),
    Heights(cmd::heights::HeightsCmd),
    DumpConfig(cmd::dump_config::DumpConfigCmd),
}

impl SubCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        match self {
            Self::Analyze(i) => i.run(opts),
            Self::Heights(i) => i.run(opts),
            Self::DumpConfig(i) => i.run(opts),
        }
    }
}

// Logs go to stderr; stdout carries the report.
fn init_logging(verbose: u8) {
    let env_filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn main() {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    if let Err(e) = opts.cmd.run(&opts) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
