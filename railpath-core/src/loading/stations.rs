use std::{fs::File, io::Read, path::Path};

use geo::Point;
use log::{info, warn};
use serde::Deserialize;

use crate::{
    Error,
    model::{Crs, Platform, StationPoint, StationPoints},
};

#[derive(Debug, Deserialize)]
struct StationRow {
    crs: String,
    platform: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl StationRow {
    fn into_point(self) -> Result<StationPoint, Error> {
        let platform = self
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|platform| !platform.is_empty())
            .map(Platform::parse)
            .transpose()?;
        Ok(StationPoint::new(
            Crs::parse(self.crs.trim())?,
            platform,
            Point::new(self.longitude, self.latitude),
        ))
    }
}

/// Load station boarding points from a CSV file with the columns
/// `crs,platform,latitude,longitude`. An empty platform is the station
/// itself. Rows that do not parse are logged and skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or has no header.
pub fn load_station_points(path: impl AsRef<Path>) -> Result<StationPoints, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    let stations = read_station_points(file)?;
    info!(
        "Loaded {} stations from {}",
        stations.len(),
        path.display()
    );
    Ok(stations)
}

/// [`load_station_points`] over any reader
///
/// # Errors
///
/// Returns an error if the header cannot be read.
pub fn read_station_points(reader: impl Read) -> Result<StationPoints, Error> {
    let mut reader = csv::Reader::from_reader(reader);
    reader.headers()?;

    let mut skipped = 0_usize;
    let stations = reader
        .deserialize::<StationRow>()
        .filter_map(|row| match row.map_err(Error::from).and_then(StationRow::into_point) {
            Ok(point) => Some(point),
            Err(err) => {
                skipped += 1;
                warn!("Skipping station row: {err}");
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!("Skipped {skipped} malformed station rows");
    }
    Ok(stations)
}
