//! Settings for the GRASS GIS 7 provider.
//!
//! Settings are layered from (later wins): a per-user `grass7.toml` in the
//! platform config directory, a project-level `.grass7.toml`, and a
//! project-level `grass7.toml`. All files are optional; missing files fall
//! back to defaults.

use std::path::Path;

use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Configured GRASS GIS 7 install folder. When unset, platform
    /// heuristics are used to locate the installation.
    pub folder: Option<Utf8PathBuf>,

    /// Log every queued command before a run.
    pub log_commands: bool,

    /// Mirror all collected console output into the application log after
    /// a run.
    pub log_console: bool,

    /// Override for the manual location; falls back to local docs folders
    /// and then the osgeo.org manuals URL.
    pub help_path: Option<String>,

    /// Default region extent applied by hosts when building command lists.
    pub region: RegionSettings,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegionSettings {
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
    pub cellsize: Option<f64>,
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("org", "grass7-provider", "grass7")
            .map(|proj_dirs| proj_dirs.config_dir().join("grass7.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join(".grass7.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("grass7.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }
}
