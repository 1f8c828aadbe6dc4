//! Synchronous GRASS command execution.
//!
//! The executor writes the queued commands into a generated job file,
//! prepares the child environment (or, on Windows, a launcher script that
//! sets the environment itself), spawns the GRASS launcher, and streams its
//! combined stdout/stderr line by line. Lines carrying the
//! `GRASS_INFO_PERCENT` marker become progress updates; everything else is
//! forwarded to the caller's feedback sink.
//!
//! Execution blocks the calling thread until the child's output stream
//! ends. There is no timeout and no cancellation; the exit status is not
//! interpreted — stream termination is completion.

use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::process::Command;
use std::process::Stdio;

use grass7_conf::Settings;
use thiserror::Error;

use crate::install::CheckError;
use crate::install::Installation;
use crate::script;
use crate::session::Session;

const PROGRESS_MARKER: &str = "GRASS_INFO_PERCENT";

/// Substrings signalling that an export command actually ran. Used to
/// decide whether the secondary command list needs a re-run.
const OUTPUT_MARKERS: [&str; 2] = ["r.out", "v.out"];

/// Caller-supplied progress/log sink, handed to every execution call.
pub trait Feedback {
    fn set_progress(&mut self, percent: i32);
    fn push_console_info(&mut self, line: &str);
}

/// A sink that drops everything. Used by the installation self-test.
#[derive(Debug, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn set_progress(&mut self, _percent: i32) {}
    fn push_console_info(&mut self, _line: &str) {}
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no GRASS session is running")]
    NoSession,

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("failed to prepare the GRASS launch environment")]
    Prepare(#[source] io::Error),

    #[error("failed to run the GRASS launcher `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read GRASS console output")]
    Stream(#[source] io::Error),
}

/// What a run produced: the collected console lines, whether an export
/// command was observed, and how many launcher invocations happened.
#[derive(Debug, Default)]
pub struct RunReport {
    pub console: Vec<String>,
    pub output_detected: bool,
    pub runs: u32,
}

/// Executes command lists against one installation and session.
pub struct Executor<'a> {
    install: &'a Installation,
    session: &'a Session,
    settings: &'a Settings,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(install: &'a Installation, session: &'a Session, settings: &'a Settings) -> Self {
        Self {
            install,
            session,
            settings,
        }
    }

    /// Runs `commands` to completion.
    ///
    /// Some GRASS scripts (e.g. `r.mapcalculator`) internally delegate to
    /// other GRASS scripts, which consumes any commands still queued in the
    /// job file — usually the output ones. When no export command was
    /// observed and `output_commands` is supplied, those are replayed in a
    /// second, otherwise identical run.
    pub fn run(
        &self,
        commands: &[String],
        output_commands: Option<&[String]>,
        feedback: &mut dyn Feedback,
    ) -> Result<RunReport, ExecError> {
        if self.settings.log_commands {
            for command in commands {
                tracing::info!(target: "grass7::commands", "{command}");
            }
        }

        let mut report = RunReport::default();
        self.run_once(commands, feedback, &mut report)?;

        if !report.output_detected {
            if let Some(output_commands) = output_commands {
                tracing::debug!("no export command was observed, re-running the output commands");
                self.run_once(output_commands, feedback, &mut report)?;
            }
        }

        if self.settings.log_console {
            tracing::info!(target: "grass7::console", "GRASS GIS 7 execution console output");
            for line in &report.console {
                tracing::info!(target: "grass7::console", "{line}");
            }
        }

        Ok(report)
    }

    fn run_once(
        &self,
        commands: &[String],
        feedback: &mut dyn Feedback,
        report: &mut RunReport,
    ) -> Result<(), ExecError> {
        let mut command = self.prepare(commands)?;
        let program = command.get_program().to_string_lossy().into_owned();

        // One pipe for both streams, so the child's stdout and stderr come
        // back interleaved the way GRASS printed them.
        let (reader, writer) = io::pipe().map_err(ExecError::Prepare)?;
        command
            .stdout(writer.try_clone().map_err(ExecError::Prepare)?)
            .stderr(writer)
            .stdin(Stdio::null());

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            command: program,
            source,
        })?;
        // The command still holds both pipe writers; they must go before
        // reading, or the reader never sees EOF.
        drop(command);

        for line in BufReader::new(reader).lines() {
            let line = line.map_err(ExecError::Stream)?;
            scan_line(&line, feedback, report);
        }

        let status = child.wait().map_err(ExecError::Stream)?;
        tracing::debug!(%status, "GRASS launcher finished");
        report.runs += 1;

        Ok(())
    }

    /// Writes the per-run files into the session workspace and builds the
    /// launcher invocation with its environment.
    fn prepare(&self, commands: &[String]) -> Result<Command, ExecError> {
        let gisrc = self.session.gisrc_path();
        script::write_gisrc(&gisrc, self.session.gisdbase()).map_err(ExecError::Prepare)?;

        #[cfg(windows)]
        {
            let script_path = self.session.script_path();
            let home = directories::BaseDirs::new()
                .and_then(|dirs| {
                    camino::Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok()
                })
                .ok_or_else(|| {
                    ExecError::Prepare(io::Error::new(
                        io::ErrorKind::NotFound,
                        "home directory not found",
                    ))
                })?;
            let folder = self.install.folder.as_deref().ok_or_else(|| {
                ExecError::Prepare(io::Error::new(
                    io::ErrorKind::NotFound,
                    "GRASS install folder is not configured",
                ))
            })?;

            script::write_windows_script(
                &script_path,
                &script::LauncherScript {
                    folder,
                    gisrc: &gisrc,
                    version: &self.install.version,
                    home: &home,
                    commands,
                },
            )
            .map_err(ExecError::Prepare)?;

            let mut command = Command::new("cmd.exe");
            command.arg("/C").arg(&script_path);
            Ok(command)
        }

        #[cfg(not(windows))]
        {
            let job = self.session.job_path();
            script::write_job_file(&job, commands).map_err(ExecError::Prepare)?;

            let mut command = self.launcher();
            command.arg(self.session.mapset_path());
            command
                .env("GISRC", &gisrc)
                .env("GRASS_MESSAGE_FORMAT", "plain")
                .env("GRASS_BATCH_JOB", &job)
                .env_remove("GISBASE");
            Ok(command)
        }
    }

    #[cfg(not(windows))]
    fn launcher(&self) -> Command {
        // macOS bundles ship a grass.sh wrapper that must be preferred over
        // the bare launcher.
        if cfg!(target_os = "macos") {
            if let Some(folder) = &self.install.folder {
                let wrapper = folder.join("grass.sh");
                if wrapper.exists() {
                    return Command::new(wrapper);
                }
            }
        }
        Command::new(&self.install.launcher)
    }
}

fn scan_line(line: &str, feedback: &mut dyn Feedback, report: &mut RunReport) {
    if line.contains(PROGRESS_MARKER) {
        // Malformed percentages are dropped; marker lines never reach the
        // console sink.
        if let Some(percent) = parse_progress(line) {
            feedback.set_progress(percent);
        }
        return;
    }

    if OUTPUT_MARKERS.iter().any(|marker| line.contains(marker)) {
        report.output_detected = true;
    }
    report.console.push(line.to_string());
    feedback.push_console_info(line);
}

/// Extracts the percentage from a progress-marker line. Accepts the
/// `GRASS_INFO_PERCENT: 42` form emitted under plain message formatting as
/// well as the bare `GRASS_INFO_PERCENT 42` form.
fn parse_progress(line: &str) -> Option<i32> {
    let idx = line.find(PROGRESS_MARKER)?;
    line[idx + PROGRESS_MARKER.len()..]
        .trim_matches(&[':', '=', ' '][..])
        .trim()
        .parse()
        .ok()
}
