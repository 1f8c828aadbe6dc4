//! Generated launch files consumed by the GRASS binary.
//!
//! Three text files are produced per run: the job file (one command per
//! line, `exit`-terminated) handed to GRASS through `GRASS_BATCH_JOB`, the
//! `gisrc` file naming the scratch GISDBASE, and — on Windows, where the
//! environment-variable mechanism is unavailable — a batch script that sets
//! up the GRASS environment itself before replaying the commands.

use std::fmt::Write as _;
use std::fs;
use std::io;

use camino::Utf8Path;

use crate::session;

pub const JOB_FILE: &str = "grass7_batch_job.sh";
pub const SCRIPT_FILE: &str = "grass7_script.bat";
pub const GISRC_FILE: &str = "grass7.gisrc";

/// Writes the batch job: every command verbatim, one per line, followed by
/// a single `exit` terminator. Marked executable on Unix, since GRASS runs
/// it as a shell script.
pub fn write_job_file(path: &Utf8Path, commands: &[String]) -> io::Result<()> {
    let mut job = String::new();
    for command in commands {
        let _ = writeln!(job, "{command}");
    }
    job.push_str("exit\n");
    fs::write(path, job)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

/// Writes the `gisrc` file pointing GRASS at the scratch workspace.
pub fn write_gisrc(path: &Utf8Path, gisdbase: &Utf8Path) -> io::Result<()> {
    let mut gisrc = String::new();
    let _ = writeln!(gisrc, "GISDBASE: {gisdbase}");
    let _ = writeln!(gisrc, "LOCATION_NAME: {}", session::LOCATION);
    let _ = writeln!(gisrc, "MAPSET: {}", session::MAPSET);
    let _ = writeln!(gisrc, "GRASS_GUI: text");
    fs::write(path, gisrc)
}

/// Inputs for the Windows launcher script.
pub struct LauncherScript<'a> {
    pub folder: &'a Utf8Path,
    pub gisrc: &'a Utf8Path,
    pub version: &'a str,
    pub home: &'a Utf8Path,
    pub commands: &'a [String],
}

/// Writes the Windows launcher: a batch script that replaces the GRASS
/// `etc/Init.bat` environment setup and then replays the command list.
pub fn write_windows_script(path: &Utf8Path, script: &LauncherScript<'_>) -> io::Result<()> {
    let folder = script.folder;
    let mut out = String::new();

    let _ = writeln!(out, "set HOME={}", script.home);
    let _ = writeln!(out, "set GISRC={}", script.gisrc);
    let _ = writeln!(out, "set WINGISBASE={folder}");
    let _ = writeln!(out, "set GISBASE={folder}");
    let _ = writeln!(out, "set GRASS_PROJSHARE={}", folder.join("share").join("proj"));
    let _ = writeln!(out, "set GRASS_MESSAGE_FORMAT=plain");
    let _ = writeln!(
        out,
        "if \"%GRASS_ADDON_PATH%\"==\"\" set PATH=%WINGISBASE%\\bin;%WINGISBASE%\\lib;%PATH%"
    );
    let _ = writeln!(
        out,
        "if not \"%GRASS_ADDON_PATH%\"==\"\" set PATH=%WINGISBASE%\\bin;%WINGISBASE%\\lib;%GRASS_ADDON_PATH%;%PATH%"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "set GRASS_VERSION={}", script.version);
    let _ = writeln!(out, "if not \"%LANG%\"==\"\" goto langset");
    let _ = writeln!(
        out,
        "FOR /F \"usebackq delims==\" %%i IN (`\"%WINGISBASE%\\etc\\winlocale\"`) DO @set LANG=%%i"
    );
    let _ = writeln!(out, ":langset");
    let _ = writeln!(out);
    let _ = writeln!(out, "set PATHEXT=%PATHEXT%;.PY");
    let _ = writeln!(
        out,
        "set PYTHONPATH=%PYTHONPATH%;%WINGISBASE%\\etc\\python;%WINGISBASE%\\etc\\wxpython"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "g.gisenv.exe set=\"MAPSET={}\"", session::MAPSET);
    let _ = writeln!(out, "g.gisenv.exe set=\"LOCATION={}\"", session::LOCATION);
    let _ = writeln!(out, "g.gisenv.exe set=\"LOCATION_NAME={}\"", session::LOCATION);
    let _ = writeln!(out, "g.gisenv.exe set=\"GISDBASE={}\"", script.gisrc_gisdbase());
    let _ = writeln!(out, "g.gisenv.exe set=\"GRASS_GUI=text\"");
    for command in script.commands {
        let _ = writeln!(out, "{command}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "exit");

    fs::write(path, out)
}

impl LauncherScript<'_> {
    // The gisrc file lives directly inside the GISDBASE.
    fn gisrc_gisdbase(&self) -> &Utf8Path {
        self.gisrc.parent().unwrap_or(self.gisrc)
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use tempfile::tempdir;

    use super::*;

    fn commands() -> Vec<String> {
        vec![
            "v.in.ogr input=/data/roads.shp output=roads".to_string(),
            "v.buffer input=roads output=buffered distance=100".to_string(),
            "v.out.ogr input=buffered output=/data/out.shp".to_string(),
        ]
    }

    mod job_file {
        use super::*;

        #[test]
        fn test_commands_in_order_with_terminator() {
            let dir = tempdir().unwrap();
            let path = Utf8PathBuf::from_path_buf(dir.path().join(JOB_FILE)).unwrap();
            let commands = commands();
            write_job_file(&path, &commands).unwrap();

            let content = std::fs::read_to_string(&path).unwrap();
            let lines: Vec<&str> = content.lines().collect();
            assert_eq!(lines.len(), commands.len() + 1);
            for (line, command) in lines.iter().zip(&commands) {
                assert_eq!(line, command);
            }
            assert_eq!(lines.last(), Some(&"exit"));
        }

        #[test]
        fn test_empty_command_list_still_terminated() {
            let dir = tempdir().unwrap();
            let path = Utf8PathBuf::from_path_buf(dir.path().join(JOB_FILE)).unwrap();
            write_job_file(&path, &[]).unwrap();

            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content, "exit\n");
        }

        #[test]
        #[cfg(unix)]
        fn test_job_file_is_executable() {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempdir().unwrap();
            let path = Utf8PathBuf::from_path_buf(dir.path().join(JOB_FILE)).unwrap();
            write_job_file(&path, &commands()).unwrap();

            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    mod gisrc {
        use super::*;

        #[test]
        fn test_gisrc_contents() {
            let dir = tempdir().unwrap();
            let path = Utf8PathBuf::from_path_buf(dir.path().join(GISRC_FILE)).unwrap();
            write_gisrc(&path, Utf8Path::new("/tmp/grassdata-abc")).unwrap();

            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(
                content,
                "GISDBASE: /tmp/grassdata-abc\n\
                 LOCATION_NAME: temp_location\n\
                 MAPSET: PERMANENT\n\
                 GRASS_GUI: text\n"
            );
        }
    }

    mod windows_script {
        use super::*;

        #[test]
        fn test_script_structure() {
            let dir = tempdir().unwrap();
            let path = Utf8PathBuf::from_path_buf(dir.path().join(SCRIPT_FILE)).unwrap();
            let commands = commands();
            let script = LauncherScript {
                folder: Utf8Path::new("C:/OSGeo4W/apps/grass/grass-7.2.1"),
                gisrc: Utf8Path::new("C:/scratch/grass7.gisrc"),
                version: "7.2.1",
                home: Utf8Path::new("C:/Users/test"),
                commands: &commands,
            };
            write_windows_script(&path, &script).unwrap();

            let content = std::fs::read_to_string(&path).unwrap();
            assert!(content.starts_with("set HOME=C:/Users/test\n"));
            assert!(content.contains("set GISBASE=C:/OSGeo4W/apps/grass/grass-7.2.1\n"));
            assert!(content.contains("set GRASS_MESSAGE_FORMAT=plain\n"));
            assert!(content.contains("set GRASS_VERSION=7.2.1\n"));
            assert!(content.contains("g.gisenv.exe set=\"GISDBASE=C:/scratch\"\n"));
            for command in &commands {
                assert!(content.contains(&format!("{command}\n")));
            }
            assert!(content.ends_with("exit\n"));

            // Commands come after the environment setup, in order.
            let first = content.find(&commands[0]).unwrap();
            let second = content.find(&commands[1]).unwrap();
            let gisenv = content.find("g.gisenv.exe").unwrap();
            assert!(gisenv < first);
            assert!(first < second);
        }
    }
}
