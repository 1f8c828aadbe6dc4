use anyhow::Result;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Manual;

impl Command for Manual {
    fn execute(&self, _args: &GlobalArgs) -> Result<Exit> {
        let mut provider = crate::commands::provider()?;
        Ok(Exit::success().with_message(provider.help_path()))
    }
}
