use anyhow::Result;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Check {
    /// Re-run the full check even if a previous one succeeded.
    #[arg(long)]
    force: bool,
}

impl Command for Check {
    fn execute(&self, _args: &GlobalArgs) -> Result<Exit> {
        let mut provider = crate::commands::provider()?;

        match provider.ensure_ready(self.force) {
            Ok(()) => {
                let version = provider
                    .installation(false)
                    .map(|install| install.version.clone())
                    .unwrap_or_default();
                Ok(Exit::success().with_message(format!(
                    "GRASS GIS {version} is correctly installed and configured."
                )))
            }
            Err(err) => Ok(Exit::error().with_message(err.to_string())),
        }
    }
}
