use std::path::Path;

use log::debug;
use railpath_core::{
    Crs, LegCall, LegLine, NetworkConfig, NetworkPath, Platform, RouteEngine, StationPoints,
    create_route_engine,
};

use crate::Error;

/// Route engine driven by raw station codes and platform labels
#[derive(Debug)]
pub struct RouteMap {
    engine: RouteEngine<StationPoints>,
}

impl RouteMap {
    /// Load the network and stations named by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or its files cannot
    /// be loaded
    pub fn new(config: &NetworkConfig) -> Result<Self, Error> {
        Ok(Self::from_engine(create_route_engine(config)?))
    }

    /// Load the configuration from a TOML file, then the network it names
    ///
    /// # Errors
    ///
    /// See [`RouteMap::new`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(&NetworkConfig::from_toml_file(path)?)
    }

    pub fn from_engine(engine: RouteEngine<StationPoints>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RouteEngine<StationPoints> {
        &self.engine
    }

    /// Shortest route between two stations. An empty or missing platform
    /// means any platform of the station.
    ///
    /// # Errors
    ///
    /// Returns an error if a station code or platform label is malformed,
    /// before the network is touched
    pub fn shortest_path(
        &self,
        origin: &str,
        origin_platform: Option<&str>,
        destination: &str,
        destination_platform: Option<&str>,
    ) -> Result<Option<NetworkPath>, Error> {
        let origin = parse_call(origin, origin_platform)?;
        let destination = parse_call(destination, destination_platform)?;
        debug!("Route requested: {origin:?} -> {destination:?}");

        Ok(self.engine.find_shortest_path(
            &origin.crs,
            origin.platform.as_ref(),
            &destination.crs,
            destination.platform.as_ref(),
        )?)
    }

    /// Route through every call of a leg, given as `(station, platform)`
    ///
    /// # Errors
    ///
    /// Returns an error if any station code or platform label is malformed
    pub fn leg_line(&self, calls: &[(&str, Option<&str>)]) -> Result<Option<LegLine>, Error> {
        let calls = calls
            .iter()
            .map(|&(crs, platform)| parse_call(crs, platform))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(self.engine.build_leg_line(&calls)?)
    }
}

fn parse_call(crs: &str, platform: Option<&str>) -> Result<LegCall, Error> {
    let platform = platform
        .map(str::trim)
        .filter(|platform| !platform.is_empty())
        .map(Platform::parse)
        .transpose()?;
    Ok(LegCall::new(Crs::parse(crs.trim())?, platform))
}
