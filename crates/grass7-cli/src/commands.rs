mod check;
mod exec;
mod manual;
mod version;

use anyhow::Result;
use clap::Subcommand;
use grass7_conf::Settings;
use grass7_provider::Provider;

use crate::args::GlobalArgs;
use crate::exit::Exit;

pub trait Command {
    fn execute(&self, args: &GlobalArgs) -> Result<Exit>;
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check that GRASS GIS 7 is installed and working
    Check(self::check::Check),
    /// Run a command list in a scratch GRASS session
    Exec(self::exec::Exec),
    /// Print where the GRASS manual lives
    Manual(self::manual::Manual),
    /// Print the detected GRASS GIS 7 version
    Version(self::version::Version),
}

impl CliCommand {
    pub fn execute(&self, args: &GlobalArgs) -> Result<Exit> {
        match self {
            Self::Check(cmd) => cmd.execute(args),
            Self::Exec(cmd) => cmd.execute(args),
            Self::Manual(cmd) => cmd.execute(args),
            Self::Version(cmd) => cmd.execute(args),
        }
    }
}

/// Builds a provider from the settings of the current working directory.
fn provider() -> Result<Provider> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::new(&cwd)?;
    Ok(Provider::new(settings))
}
