//! Station boarding points and the lookup that resolves them

use geo::Point;
use hashbrown::HashMap;

use super::identity::{Crs, Platform, StationNodeId};
use crate::NodeKey;

/// A physical boarding point: a station, optionally one of its platforms,
/// and where it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationPoint {
    pub crs: Crs,
    pub platform: Option<Platform>,
    /// WGS84 position (x = longitude, y = latitude)
    pub geometry: Point<f64>,
}

impl StationPoint {
    pub fn new(crs: Crs, platform: Option<Platform>, geometry: Point<f64>) -> Self {
        Self {
            crs,
            platform,
            geometry,
        }
    }

    pub fn node_id(&self) -> StationNodeId {
        StationNodeId::new(self.crs, self.platform)
    }

    /// Key of the network node standing for this point
    pub fn key(&self) -> NodeKey {
        self.node_id().key()
    }
}

/// One call of a journey leg, before it is resolved to boarding points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegCall {
    pub crs: Crs,
    pub platform: Option<Platform>,
}

impl LegCall {
    pub fn new(crs: Crs, platform: Option<Platform>) -> Self {
        Self { crs, platform }
    }
}

/// Resolves station codes and platforms to boarding points.
///
/// A known platform yields its single point. No platform, or a platform the
/// lookup does not know, yields every point of the station. An unknown
/// station yields nothing.
pub trait StationLookup {
    fn station_points(&self, crs: &Crs, platform: Option<&Platform>) -> Vec<StationPoint>;
}

/// In-memory station lookup
#[derive(Debug, Clone, Default)]
pub struct StationPoints {
    stations: HashMap<Crs, Vec<StationPoint>>,
}

impl StationPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point. A second point for the same station and platform
    /// replaces the first.
    pub fn insert(&mut self, point: StationPoint) {
        let points = self.stations.entry(point.crs).or_default();
        match points.iter_mut().find(|p| p.platform == point.platform) {
            Some(existing) => *existing = point,
            None => points.push(point),
        }
    }

    /// Number of stations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Every known point of a station
    pub fn points(&self, crs: &Crs) -> &[StationPoint] {
        self.stations.get(crs).map_or(&[], Vec::as_slice)
    }
}

impl FromIterator<StationPoint> for StationPoints {
    fn from_iter<I: IntoIterator<Item = StationPoint>>(iter: I) -> Self {
        let mut stations = Self::new();
        for point in iter {
            stations.insert(point);
        }
        stations
    }
}

impl StationLookup for StationPoints {
    fn station_points(&self, crs: &Crs, platform: Option<&Platform>) -> Vec<StationPoint> {
        let points = self.points(crs);
        if let Some(platform) = platform {
            if let Some(point) = points.iter().find(|p| p.platform.as_ref() == Some(platform)) {
                return vec![*point];
            }
        }
        points.to_vec()
    }
}
