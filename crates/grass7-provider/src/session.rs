//! Scratch mapset lifecycle.
//!
//! A session is the lifetime of one throwaway GRASS workspace: a GISDBASE
//! directory under the system temp root holding a `temp_location` location
//! with a single `PERMANENT` mapset. The mapset is written with sane
//! defaults (unit region, sqlite driver) so GRASS accepts it as valid; the
//! real projection is set later from the first input layer.
//!
//! The session also caches which logical layers have already been exported
//! into the workspace, so consecutive operations can reuse them instead of
//! re-exporting.

use std::fs;
use std::io;
use std::path::PathBuf;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use tempfile::TempDir;
use thiserror::Error;

use crate::region::Region;
use crate::script;

pub const LOCATION: &str = "temp_location";
pub const MAPSET: &str = "PERMANENT";

const MAPSET_TITLE: &str = "GRASS GIS 7 provider: temporary data processing location.\n";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to create the scratch workspace")]
    Io(#[from] io::Error),

    #[error("temp directory path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// One scratch GRASS workspace, from `start` to `end`.
///
/// Not thread-aware; the provider assumes a single logical caller at a
/// time. Dropping the session removes the workspace, but hosts should call
/// [`Provider::end_session`](crate::Provider::end_session) explicitly.
#[derive(Debug)]
pub struct Session {
    dir: TempDir,
    root: Utf8PathBuf,
    layers: FxHashMap<String, Utf8PathBuf>,
}

impl Session {
    pub fn open() -> Result<Self, SessionError> {
        let dir = tempfile::Builder::new().prefix("grassdata-").tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(SessionError::NonUtf8Path)?;

        let permanent = root.join(LOCATION).join(MAPSET);
        fs::create_dir_all(permanent.join(".tmp"))?;
        fs::create_dir_all(permanent.join("sqlite"))?;

        let region = Region::default();
        region.write_to(&permanent.join("DEFAULT_WIND"))?;
        region.write_to(&permanent.join("WIND"))?;

        fs::write(permanent.join("MYNAME"), MAPSET_TITLE)?;
        fs::write(
            permanent.join("VAR"),
            "DB_DRIVER: sqlite\n\
             DB_DATABASE: $GISDBASE/$LOCATION_NAME/$MAPSET/sqlite/sqlite.db\n",
        )?;

        tracing::debug!(gisdbase = %root, "created scratch mapset");

        Ok(Self {
            dir,
            root,
            layers: FxHashMap::default(),
        })
    }

    /// The scratch GISDBASE directory.
    pub fn gisdbase(&self) -> &Utf8Path {
        &self.root
    }

    pub fn location_path(&self) -> Utf8PathBuf {
        self.root.join(LOCATION)
    }

    pub fn mapset_path(&self) -> Utf8PathBuf {
        self.root.join(LOCATION).join(MAPSET)
    }

    pub fn gisrc_path(&self) -> Utf8PathBuf {
        self.root.join(script::GISRC_FILE)
    }

    pub fn job_path(&self) -> Utf8PathBuf {
        self.root.join(script::JOB_FILE)
    }

    pub fn script_path(&self) -> Utf8PathBuf {
        self.root.join(script::SCRIPT_FILE)
    }

    /// Layers already materialized into this workspace, by logical name.
    pub fn layers(&self) -> &FxHashMap<String, Utf8PathBuf> {
        &self.layers
    }

    /// Merges newly exported layers into the cache. Later entries win on
    /// name collision.
    pub fn add_layers<I>(&mut self, layers: I)
    where
        I: IntoIterator<Item = (String, Utf8PathBuf)>,
    {
        self.layers.extend(layers);
    }

    /// Removes the workspace. Failures are swallowed: the directory lives
    /// under the system temp root, which the host environment reclaims.
    pub fn close(self) {
        let Session { dir, root, layers: _ } = self;
        if let Err(err) = dir.close() {
            tracing::debug!(%err, gisdbase = %root, "failed to remove scratch mapset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_mapset_tree() {
        let session = Session::open().unwrap();
        let permanent = session.mapset_path();

        assert!(permanent.is_dir());
        assert!(permanent.join(".tmp").is_dir());
        assert!(permanent.join("sqlite").is_dir());
        assert!(permanent.join("DEFAULT_WIND").is_file());
        assert!(permanent.join("WIND").is_file());
        assert!(permanent.join("MYNAME").is_file());

        let var = fs::read_to_string(permanent.join("VAR")).unwrap();
        assert!(var.starts_with("DB_DRIVER: sqlite\n"));
        assert!(var.contains("$GISDBASE/$LOCATION_NAME/$MAPSET/sqlite/sqlite.db"));

        let wind = fs::read_to_string(permanent.join("WIND")).unwrap();
        let default_wind = fs::read_to_string(permanent.join("DEFAULT_WIND")).unwrap();
        assert_eq!(wind, default_wind);
        assert_eq!(wind, Region::default().to_string());
    }

    #[test]
    fn test_close_removes_workspace() {
        let session = Session::open().unwrap();
        let root = session.gisdbase().to_owned();
        assert!(root.is_dir());

        session.close();
        assert!(!root.exists());
    }

    #[test]
    fn test_add_layers_later_entries_win() {
        let mut session = Session::open().unwrap();

        session.add_layers([("a".to_string(), Utf8PathBuf::from("/x"))]);
        session.add_layers([
            ("a".to_string(), Utf8PathBuf::from("/y")),
            ("b".to_string(), Utf8PathBuf::from("/z")),
        ]);

        assert_eq!(session.layers().len(), 2);
        assert_eq!(session.layers()["a"], Utf8PathBuf::from("/y"));
        assert_eq!(session.layers()["b"], Utf8PathBuf::from("/z"));
    }
}
