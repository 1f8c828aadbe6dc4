//! GRASS GIS 7 installation discovery and validation.
//!
//! Discovery resolves the install folder (configured override first, then
//! platform conventions), then probes candidate launcher names with `-v`
//! until one reports a major-version-7 release. The full check additionally
//! runs a real geometry pipeline in a scratch workspace and verifies the
//! declared output file exists.

use std::process::Command;
use std::process::Stdio;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use grass7_conf::Settings;
use thiserror::Error;

/// Launcher names to probe, newest first. Distributions ship versioned
/// launchers alongside (or instead of) the plain `grass` one.
const LAUNCHER_CANDIDATES: [&str; 5] = ["grass73", "grass72", "grass71", "grass70", "grass"];

const VERSION_MARKER: &str = "GRASS GIS ";

/// Installation-check failure, split so callers can branch programmatically:
/// configuration problems are fixable in the settings dialog, probe failures
/// mean the toolkit itself is broken or missing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Probe(String),
}

/// A located and version-probed GRASS GIS 7 installation.
#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    /// Install folder, when one is required to launch GRASS. `None` on
    /// platforms where the launcher is resolved from `PATH`.
    pub folder: Option<Utf8PathBuf>,
    /// Launcher name that answered the probe, e.g. `grass72`.
    pub command: String,
    /// Resolved launcher executable.
    pub launcher: Utf8PathBuf,
    /// Reported version, e.g. `7.2.1`.
    pub version: String,
}

impl Installation {
    /// Locates the installation and probes its version.
    pub fn detect(settings: &Settings) -> Result<Self, CheckError> {
        let folder = install_folder(settings);

        for candidate in LAUNCHER_CANDIDATES {
            let Some(launcher) = resolve_launcher(candidate, folder.as_deref()) else {
                continue;
            };
            if let Some(version) = probe_version(&launcher) {
                tracing::debug!(%launcher, %version, "found GRASS GIS 7");
                return Ok(Self {
                    folder,
                    command: candidate.to_string(),
                    launcher,
                    version,
                });
            }
        }

        Err(CheckError::Probe(
            "It seems that GRASS GIS 7 is not correctly installed and \
             configured in your system.\nPlease install it before running \
             GRASS GIS 7 algorithms."
                .to_string(),
        ))
    }
}

/// Resolves the GRASS install folder, or `None` where launchers come from
/// `PATH` (Linux and other Unixes).
#[must_use]
pub fn install_folder(settings: &Settings) -> Option<Utf8PathBuf> {
    if let Some(folder) = &settings.folder {
        if folder.is_dir() {
            return Some(folder.clone());
        }
        tracing::warn!(%folder, "configured GRASS folder does not exist, falling back to discovery");
    }

    #[cfg(windows)]
    {
        let apps = match std::env::var("OSGEO4W_ROOT") {
            Ok(root) => Utf8PathBuf::from(root).join("apps"),
            Err(_) => Utf8PathBuf::from(std::env::var("QGIS_PREFIX_PATH").ok()?),
        };
        let grass_root = apps.join("grass");
        let entries = std::fs::read_dir(&grass_root).ok()?;
        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("grass-7") {
                return Some(grass_root.join(name.as_ref()));
            }
        }
        None
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(prefix) = std::env::var("QGIS_PREFIX_PATH") {
            let folder = Utf8PathBuf::from(prefix).join("grass7");
            if folder.is_dir() {
                return Some(folder);
            }
        }
        Some(Utf8PathBuf::from("/Applications/GRASS-7.0.app/Contents/MacOS"))
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    {
        None
    }
}

fn resolve_launcher(name: &str, folder: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    if let Some(folder) = folder {
        #[cfg(windows)]
        let file = format!("{name}.exe");
        #[cfg(not(windows))]
        let file = name.to_string();

        let candidate = folder.join("bin").join(file);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let found = which::which(name).ok()?;
    Utf8PathBuf::from_path_buf(found).ok()
}

/// Runs `<launcher> -v` and extracts an accepted version from its output.
fn probe_version(launcher: &Utf8Path) -> Option<String> {
    let output = Command::new(launcher)
        .arg("-v")
        .stdin(Stdio::null())
        .output()
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .find_map(|line| parse_version(line).map(ToString::to_string))
}

/// Extracts the version token from a `GRASS GIS <version>` banner line.
/// Only major-version-7 releases are accepted.
fn parse_version(line: &str) -> Option<&str> {
    if !line.contains(VERSION_MARKER) {
        return None;
    }
    let token = line.split_whitespace().last()?;
    token.starts_with("7.").then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod version_parsing {
        use super::*;

        #[test]
        fn test_major_version_7_accepted() {
            assert_eq!(parse_version("GRASS GIS 7.2.1"), Some("7.2.1"));
            assert_eq!(parse_version("GRASS GIS 7.0.0"), Some("7.0.0"));
        }

        #[test]
        fn test_major_version_6_rejected() {
            assert_eq!(parse_version("GRASS GIS 6.4.0"), None);
        }

        #[test]
        fn test_unrelated_line_rejected() {
            assert_eq!(parse_version("Geographic Resources Analysis"), None);
            assert_eq!(parse_version(""), None);
        }

        #[test]
        fn test_banner_with_prefix_text() {
            assert_eq!(parse_version("Welcome to GRASS GIS 7.2.1"), Some("7.2.1"));
        }
    }

    mod folder_resolution {
        use grass7_conf::Settings;
        use tempfile::tempdir;

        use super::*;

        #[test]
        fn test_configured_folder_wins() {
            let dir = tempdir().unwrap();
            let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let settings = Settings {
                folder: Some(folder.clone()),
                ..Settings::default()
            };
            assert_eq!(install_folder(&settings), Some(folder));
        }

        #[test]
        fn test_missing_configured_folder_falls_through() {
            let settings = Settings {
                folder: Some(Utf8PathBuf::from("/does/not/exist")),
                ..Settings::default()
            };
            // On Linux discovery yields no folder; on the other platforms it
            // must not return the bogus configured path.
            assert_ne!(
                install_folder(&settings),
                Some(Utf8PathBuf::from("/does/not/exist"))
            );
        }
    }

    #[cfg(unix)]
    mod probing {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        use tempfile::tempdir;

        use super::*;

        fn write_stub(dir: &std::path::Path, name: &str, banner: &str) -> Utf8PathBuf {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\necho \"{banner}\"\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            Utf8PathBuf::from_path_buf(path).unwrap()
        }

        #[test]
        fn test_probe_accepts_version_7_banner() {
            let dir = tempdir().unwrap();
            let stub = write_stub(dir.path(), "grass", "GRASS GIS 7.2.1");
            assert_eq!(probe_version(&stub), Some("7.2.1".to_string()));
        }

        #[test]
        fn test_probe_rejects_version_6_banner() {
            let dir = tempdir().unwrap();
            let stub = write_stub(dir.path(), "grass", "GRASS GIS 6.4.0");
            assert_eq!(probe_version(&stub), None);
        }

        #[test]
        fn test_probe_scans_past_noise_lines() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("grass");
            fs::write(
                &path,
                "#!/bin/sh\necho \"Geographic Resources Analysis Support System\"\necho \"GRASS GIS 7.0.4\"\n",
            )
            .unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            let stub = Utf8PathBuf::from_path_buf(path).unwrap();
            assert_eq!(probe_version(&stub), Some("7.0.4".to_string()));
        }

        #[test]
        fn test_probe_missing_binary() {
            assert_eq!(probe_version(Utf8Path::new("/does/not/exist/grass")), None);
        }
    }
}
