//! Provider adapter for running GRASS GIS 7 tools from a host GIS
//! application.
//!
//! The [`Provider`] owns everything the original toolkit wrapper kept in
//! process-wide state: the settings, the cached installation probe, the
//! verified flag, and the (at most one) running scratch session. Hosts
//! create one provider, check the installation, start a session, execute
//! command lists against it, and end the session when the processing chain
//! is done.

pub mod exec;
pub mod help;
pub mod install;
pub mod region;
pub mod script;
pub mod session;

use std::fs;

pub use exec::ExecError;
pub use exec::Executor;
pub use exec::Feedback;
pub use exec::NullFeedback;
pub use exec::RunReport;
pub use grass7_conf::ConfigError;
pub use grass7_conf::Settings;
pub use install::CheckError;
pub use install::Installation;
pub use region::Region;
pub use session::Session;
pub use session::SessionError;

/// Points used by the functional self-test, in `v.in.ascii` pipe format.
const SELF_TEST_POINTS: &str = "0|0\n0|1\n1|0\n1|1\n0.5|0.5\n";

/// The GRASS GIS 7 provider context.
///
/// Single logical caller at a time; nothing here is thread-aware.
#[derive(Debug)]
pub struct Provider {
    settings: Settings,
    install: Option<Installation>,
    verified: bool,
    session: Option<Session>,
}

impl Provider {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            install: None,
            verified: false,
            session: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Locates the installation and probes its version, caching the result
    /// for the lifetime of the provider. Pass `force` to re-probe.
    pub fn installation(&mut self, force: bool) -> Result<&Installation, CheckError> {
        if force || self.install.is_none() {
            self.install = Some(Installation::detect(&self.settings)?);
        }
        match self.install.as_ref() {
            Some(install) => Ok(install),
            None => unreachable!("installation cached above"),
        }
    }

    /// Full installation check: locate, version-probe, then run a real
    /// geometry pipeline in a scratch workspace and verify its declared
    /// output exists. Success is cached; pass `force` to re-check.
    pub fn ensure_ready(&mut self, force: bool) -> Result<(), CheckError> {
        if self.verified && !force {
            return Ok(());
        }

        #[cfg(windows)]
        {
            let Some(folder) = install::install_folder(&self.settings) else {
                return Err(CheckError::Config(
                    "GRASS GIS 7 folder is not configured. Please configure \
                     it before running GRASS GIS 7 algorithms."
                        .to_string(),
                ));
            };
            let modules_probe = folder.join("bin").join("r.out.gdal.exe");
            if !modules_probe.exists() {
                return Err(CheckError::Config(format!(
                    "The specified GRASS 7 folder \"{}\" does not contain a \
                     valid set of GRASS 7 modules.\nPlease check that the \
                     GRASS 7 folder is correctly configured",
                    folder.join("bin")
                )));
            }
        }

        let install = self.installation(force)?.clone();
        self.self_test(&install)?;
        self.verified = true;

        Ok(())
    }

    /// Runs `v.in.ascii` → `v.voronoi` → `v.out.ogr` over a built-in point
    /// set in a throwaway session and checks the export landed on disk.
    fn self_test(&self, install: &Installation) -> Result<(), CheckError> {
        let probe_failed = |detail: String| {
            CheckError::Probe(format!(
                "Error while checking GRASS GIS 7 installation. GRASS GIS 7 \
                 might not be correctly configured.\n{detail}"
            ))
        };

        let session = Session::open().map_err(|err| probe_failed(err.to_string()))?;

        let points_path = session.gisdbase().join("check_points.txt");
        fs::write(&points_path, SELF_TEST_POINTS)
            .map_err(|err| probe_failed(err.to_string()))?;
        let output_path = session.gisdbase().join("check_voronoi.geojson");

        let commands = vec![
            format!("v.in.ascii input={points_path} output=check_points separator=pipe --overwrite"),
            "v.voronoi input=check_points output=check_voronoi --overwrite".to_string(),
            format!("v.out.ogr input=check_voronoi output={output_path} format=GeoJSON --overwrite"),
        ];

        Executor::new(install, &session, &self.settings)
            .run(&commands, None, &mut NullFeedback)
            .map_err(|err| probe_failed(err.to_string()))?;

        if !output_path.is_file() {
            return Err(CheckError::Probe(
                "It seems that GRASS GIS 7 is not correctly installed and \
                 configured in your system.\nPlease install it before \
                 running GRASS GIS 7 algorithms."
                    .to_string(),
            ));
        }

        session.close();
        Ok(())
    }

    /// Starts a session if none is running. Starting twice is a no-op.
    pub fn start_session(&mut self) -> Result<(), SessionError> {
        if self.session.is_none() {
            self.session = Some(Session::open()?);
            tracing::debug!("GRASS session started");
        }
        Ok(())
    }

    /// Ends the running session, removing its workspace and clearing the
    /// layer cache. No-op when no session is running.
    pub fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            tracing::debug!("GRASS session ended");
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Executes a command list against the running session.
    pub fn execute(
        &mut self,
        commands: &[String],
        output_commands: Option<&[String]>,
        feedback: &mut dyn Feedback,
    ) -> Result<RunReport, ExecError> {
        let install = self.installation(false)?.clone();
        let Some(session) = self.session.as_ref() else {
            return Err(ExecError::NoSession);
        };

        Executor::new(&install, session, &self.settings).run(commands, output_commands, feedback)
    }

    /// Where the GRASS manual lives, for the host's help buttons.
    pub fn help_path(&mut self) -> String {
        let command = self
            .installation(false)
            .map(|install| install.command.clone())
            .unwrap_or_else(|_| "grass".to_string());
        let folder = self
            .install
            .as_ref()
            .and_then(|install| install.folder.clone())
            .or_else(|| install::install_folder(&self.settings));

        help::help_path(&self.settings, &command, folder.as_deref())
    }
}
