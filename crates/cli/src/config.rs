//! Command-line configuration.

use clap::Parser;

use crate::commands::Command;

/// Inspect weighted consistent-hash server sets.
#[derive(Debug, Parser)]
#[command(name = "serverset", version, about)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        tracing_subscriber::fmt::init();
        self.command.run()
    }
}
