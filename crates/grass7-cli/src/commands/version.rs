use anyhow::Result;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Version {
    /// Re-probe instead of using the cached result.
    #[arg(long)]
    force: bool,
}

impl Command for Version {
    fn execute(&self, _args: &GlobalArgs) -> Result<Exit> {
        let mut provider = crate::commands::provider()?;

        match provider.installation(self.force) {
            Ok(install) => Ok(Exit::success()
                .with_message(format!("GRASS GIS {} ({})", install.version, install.launcher))),
            Err(err) => Ok(Exit::error().with_message(err.to_string())),
        }
    }
}
