//! # Route loading
//!
//! Route files are CSV with one waypoint per line as `x,y,z,yaw` and no
//! header. The files carry no speed so every waypoint is given the route's
//! configured speed limit.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use nalgebra::Vector3;
use serde::Deserialize;

use super::{RouteError, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One line of a route file.
#[derive(Debug, Deserialize)]
struct RouteRecord {
    x: f64,
    y: f64,
    z: f64,
    yaw: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load the route's waypoints from a CSV file.
pub fn load_csv<P: AsRef<Path>>(path: P, speed_ms: f64) -> Result<Vec<Waypoint>, RouteError> {
    let reader = ReaderBuilder::new().has_headers(false).from_path(path)?;

    read_records(reader, speed_ms)
}

fn read_records<R: Read>(
    mut reader: csv::Reader<R>,
    speed_ms: f64,
) -> Result<Vec<Waypoint>, RouteError> {
    let mut waypoints = Vec::new();

    for record in reader.deserialize() {
        let r: RouteRecord = record?;
        waypoints.push(Waypoint::new(Vector3::new(r.x, r.y, r.z), r.yaw, speed_ms));
    }

    if waypoints.is_empty() {
        return Err(RouteError::EmptyRoute);
    }

    Ok(waypoints)
}

/// Generate an anticlockwise circular route centred on the origin, used when
/// no route file is given.
pub fn circular_route(radius_m: f64, num_waypoints: usize, speed_ms: f64) -> Vec<Waypoint> {
    (0..num_waypoints)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (num_waypoints as f64);
            Waypoint::new(
                Vector3::new(radius_m * theta.cos(), radius_m * theta.sin(), 0.0),
                theta + std::f64::consts::FRAC_PI_2,
                speed_ms,
            )
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn test_read_records() {
        let data = "909.48,1128.67,0.0,0.0128\n\
                    910.39,1128.68,0.0,0.0128\n\
                    911.30,1128.69,0.0,0.0128\n";

        let wps = read_records(reader(data), 11.1).unwrap();
        assert_eq!(wps.len(), 3);
        assert_eq!(wps[1].position_m, Vector3::new(910.39, 1128.68, 0.0));
        assert_eq!(wps[1].yaw_rad, 0.0128);
        assert!(wps.iter().all(|w| w.speed_ms == 11.1));
    }

    #[test]
    fn test_read_records_errors() {
        assert!(matches!(
            read_records(reader(""), 1.0),
            Err(RouteError::EmptyRoute)
        ));
        assert!(matches!(
            read_records(reader("1.0,2.0,zero,0.0\n"), 1.0),
            Err(RouteError::CsvError(_))
        ));
    }

    #[test]
    fn test_circular_route() {
        let wps = circular_route(10.0, 4, 2.0);
        assert_eq!(wps.len(), 4);
        assert!((wps[1].position_m - Vector3::new(0.0, 10.0, 0.0)).norm() < 1e-9);
        assert!((wps[0].yaw_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
