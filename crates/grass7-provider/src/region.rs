//! The GRASS region (window) descriptor.
//!
//! GRASS expects every mapset to carry a `DEFAULT_WIND` and a `WIND` file
//! describing the current computational region. The on-disk format is a
//! fixed set of 18 `key: value` lines; GRASS refuses the mapset if any of
//! them is missing.

use std::fmt;
use std::fs;
use std::io;

use camino::Utf8Path;

/// A GRASS computational region.
///
/// The default region is the single-cell unit extent written into scratch
/// mapsets; the real projection and extent are set later by the host, based
/// on the first input layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub proj: u32,
    pub zone: u32,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub cols: u64,
    pub rows: u64,
    pub ew_resol: f64,
    pub ns_resol: f64,
    pub top: f64,
    pub bottom: f64,
    pub cols3: u64,
    pub rows3: u64,
    pub depths: u64,
    pub ew_resol3: f64,
    pub ns_resol3: f64,
    pub tb_resol: f64,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            proj: 0,
            zone: 0,
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
            cols: 1,
            rows: 1,
            ew_resol: 1.0,
            ns_resol: 1.0,
            top: 1.0,
            bottom: 0.0,
            cols3: 1,
            rows3: 1,
            depths: 1,
            ew_resol3: 1.0,
            ns_resol3: 1.0,
            tb_resol: 1.0,
        }
    }
}

impl Region {
    pub fn write_to(&self, path: &Utf8Path) -> io::Result<()> {
        fs::write(path, self.to_string())
    }
}

/// Renders whole-valued coordinates without a decimal point, the way GRASS
/// itself writes them.
struct Coord(f64);

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12}{}", "proj:", self.proj)?;
        writeln!(f, "{:<12}{}", "zone:", self.zone)?;
        writeln!(f, "{:<12}{}", "north:", Coord(self.north))?;
        writeln!(f, "{:<12}{}", "south:", Coord(self.south))?;
        writeln!(f, "{:<12}{}", "east:", Coord(self.east))?;
        writeln!(f, "{:<12}{}", "west:", Coord(self.west))?;
        writeln!(f, "{:<12}{}", "cols:", self.cols)?;
        writeln!(f, "{:<12}{}", "rows:", self.rows)?;
        writeln!(f, "{:<12}{}", "e-w resol:", Coord(self.ew_resol))?;
        writeln!(f, "{:<12}{}", "n-s resol:", Coord(self.ns_resol))?;
        writeln!(f, "{:<12}{}", "top:", Coord(self.top))?;
        writeln!(f, "{:<12}{}", "bottom:", Coord(self.bottom))?;
        writeln!(f, "{:<12}{}", "cols3:", self.cols3)?;
        writeln!(f, "{:<12}{}", "rows3:", self.rows3)?;
        writeln!(f, "{:<12}{}", "depths:", self.depths)?;
        writeln!(f, "{:<12}{}", "e-w resol3:", Coord(self.ew_resol3))?;
        writeln!(f, "{:<12}{}", "n-s resol3:", Coord(self.ns_resol3))?;
        writeln!(f, "{:<12}{}", "t-b resol:", Coord(self.tb_resol))
    }
}
