//! Waypoint map loading
//!
//! One waypoint per line, five whitespace-separated numbers: `x y s dx dy`.
//! Any run of spaces or tabs separates fields.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use log::info;

use crate::common::{RoboticsError, RoboticsResult};
use crate::mapping::{Waypoint, WaypointMap};

/// Read waypoints from any reader
pub fn read_waypoints<R: Read>(reader: R) -> RoboticsResult<Vec<Waypoint>> {
    let normalized = normalize_whitespace(reader)?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(normalized.as_bytes());

    let mut waypoints = Vec::new();
    for record in rdr.deserialize() {
        let waypoint: Waypoint = record?;
        waypoints.push(waypoint);
    }
    Ok(waypoints)
}

/// Rows with fields separated by single spaces, blank lines dropped
fn normalize_whitespace<R: Read>(reader: R) -> RoboticsResult<String> {
    let mut normalized = String::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let row = line.split_whitespace().join(" ");
        if !row.is_empty() {
            normalized.push_str(&row);
            normalized.push('\n');
        }
    }
    Ok(normalized)
}

/// Parse a whole map held in memory
pub fn parse_map(text: &str) -> RoboticsResult<WaypointMap> {
    WaypointMap::new(read_waypoints(text.as_bytes())?)
}

/// Load the map file at `path`. A missing or malformed map is fatal.
pub fn load_map<P: AsRef<Path>>(path: P) -> RoboticsResult<WaypointMap> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        RoboticsError::MapError(format!("cannot open {}: {}", path.display(), e))
    })?;
    let map = WaypointMap::new(read_waypoints(file)?)?;
    info!("loaded {} waypoints from {}", map.len(), path.display());
    Ok(map)
}
