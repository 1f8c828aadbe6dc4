use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::commands::CliCommand;
use crate::exit::Exit;

/// The main CLI structure that defines the command-line interface
#[derive(Parser)]
#[command(name = "grass7")]
#[command(version, about = "GRASS GIS 7 provider tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments and execute the chosen command
pub fn run(args: Vec<String>) -> Result<Exit> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    init_tracing(&cli.args.global);

    cli.command.execute(&cli.args.global)
}

fn init_tracing(args: &crate::args::GlobalArgs) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
