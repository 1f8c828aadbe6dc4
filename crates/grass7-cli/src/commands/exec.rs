use std::fs;
use std::io::Write as _;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use grass7_provider::Feedback;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Exec {
    /// Commands to run, one argument each.
    #[arg(conflicts_with = "job", required_unless_present = "job")]
    commands: Vec<String>,

    /// Read the command list from a file, one command per line.
    #[arg(long)]
    job: Option<Utf8PathBuf>,

    /// Commands to replay if no export command was observed in the run.
    #[arg(long = "output-command")]
    output_commands: Vec<String>,
}

impl Command for Exec {
    fn execute(&self, args: &GlobalArgs) -> Result<Exit> {
        let commands = match &self.job {
            Some(path) => read_job(path)?,
            None => self.commands.clone(),
        };
        if commands.is_empty() {
            return Ok(Exit::error().with_message("no commands to run"));
        }

        let output_commands = (!self.output_commands.is_empty()).then_some(&self.output_commands);

        let mut provider = crate::commands::provider()?;
        provider.start_session()?;

        let mut feedback = ConsoleFeedback { quiet: args.quiet };
        let result = provider.execute(&commands, output_commands.map(Vec::as_slice), &mut feedback);
        feedback.finish();
        provider.end_session();

        let report = result?;
        Ok(Exit::success().with_message(format!(
            "{} command(s) completed in {} run(s)",
            commands.len(),
            report.runs
        )))
    }
}

fn read_job(path: &Utf8PathBuf) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read job file {path}"))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "exit")
        .map(ToString::to_string)
        .collect())
}

/// Prints console lines to stdout and keeps a progress readout on stderr.
struct ConsoleFeedback {
    quiet: bool,
}

impl ConsoleFeedback {
    fn finish(&self) {
        if !self.quiet {
            eprintln!();
        }
    }
}

impl Feedback for ConsoleFeedback {
    fn set_progress(&mut self, percent: i32) {
        if !self.quiet {
            eprint!("\r{percent:>3}%");
            let _ = std::io::stderr().flush();
        }
    }

    fn push_console_info(&mut self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_job_skips_blanks_and_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("job.txt")).unwrap();
        fs::write(
            &path,
            "v.in.ogr input=a output=b\n\n  v.buffer input=b output=c  \nexit\n",
        )
        .unwrap();

        let commands = read_job(&path).unwrap();
        assert_eq!(
            commands,
            vec![
                "v.in.ogr input=a output=b".to_string(),
                "v.buffer input=b output=c".to_string(),
            ]
        );
    }

    #[test]
    fn test_read_job_missing_file() {
        assert!(read_job(&Utf8PathBuf::from("/does/not/exist.txt")).is_err());
    }
}
