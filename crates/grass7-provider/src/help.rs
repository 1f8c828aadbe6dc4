//! Manual (help) location resolution.

use camino::Utf8Path;
use grass7_conf::Settings;

/// Resolves where the GRASS manual pages live: the configured override
/// first, then platform-local docs folders, then the osgeo.org manuals URL
/// for the detected launcher.
#[must_use]
pub fn help_path(settings: &Settings, command: &str, folder: Option<&Utf8Path>) -> String {
    if let Some(configured) = &settings.help_path {
        return configured.clone();
    }

    if let Some(local) = local_docs(folder) {
        return local;
    }

    format!("https://grass.osgeo.org/{command}/manuals/")
}

#[cfg(windows)]
fn local_docs(folder: Option<&Utf8Path>) -> Option<String> {
    let docs = folder?.join("docs").join("html");
    docs.is_dir().then(|| docs.into_string())
}

#[cfg(target_os = "macos")]
fn local_docs(_folder: Option<&Utf8Path>) -> Option<String> {
    let docs = Utf8Path::new("/Applications/GRASS-7.0.app/Contents/MacOS/docs/html");
    docs.is_dir().then(|| docs.to_string())
}

#[cfg(not(any(windows, target_os = "macos")))]
fn local_docs(_folder: Option<&Utf8Path>) -> Option<String> {
    const SEARCH_PATHS: [&str; 3] = [
        "/usr/share/doc/grass-doc/html",
        "/opt/grass/docs/html",
        "/usr/share/doc/grass/docs/html",
    ];

    SEARCH_PATHS
        .iter()
        .find(|path| Utf8Path::new(path).is_dir())
        .map(|path| (*path).to_string())
}
