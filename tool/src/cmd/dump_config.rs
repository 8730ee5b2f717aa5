use anyhow::Result;
use clap::Parser;

use crate::Opts;

/// Print the effective configuration as JSON
#[derive(Parser, Debug)]
pub struct DumpConfigCmd;

impl DumpConfigCmd {
    pub fn run(&self, opts: &Opts) -> Result<()> {
        serde_json::to_writer_pretty(std::io::stdout(), opts.config()?)?;
        println!();
        Ok(())
    }
}
