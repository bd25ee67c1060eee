//! Shared route engine: one rail network, many concurrent requests

use std::sync::{RwLock, RwLockReadGuard};

use hashbrown::HashSet;
use log::debug;

use crate::{
    Error, NodeKey,
    algo::{InsertionOptions, insert_station_points},
    model::{Crs, LegCall, Platform, RailNetwork, StationLookup, StationPoint},
    routing::{LegLine, NetworkPath, SearchOptions, build_leg_line, find_path},
};

/// Owns the rail network and places station points into it on demand.
///
/// Searches share a read lock. A request naming points that are not in the
/// network yet takes the write lock, inserts whatever is still missing, and
/// then searches under a read lock again. Points that cannot be snapped onto
/// the track are remembered and not attempted again.
#[derive(Debug)]
pub struct RouteEngine<L> {
    network: RwLock<RailNetwork>,
    /// Only written while the network write lock is held
    unplaceable: RwLock<HashSet<NodeKey>>,
    stations: L,
    insertion: InsertionOptions,
    search: SearchOptions,
}

impl<L: StationLookup> RouteEngine<L> {
    pub fn new(
        network: RailNetwork,
        stations: L,
        insertion: InsertionOptions,
        search: SearchOptions,
    ) -> Self {
        Self {
            network: RwLock::new(network),
            unplaceable: RwLock::new(HashSet::new()),
            stations,
            insertion,
            search,
        }
    }

    pub fn stations(&self) -> &L {
        &self.stations
    }

    /// Read access to the network in its current state
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if a writer panicked.
    pub fn network(&self) -> Result<RwLockReadGuard<'_, RailNetwork>, Error> {
        self.network.read().map_err(|_| Error::LockPoisoned)
    }

    /// Whether an earlier request failed to snap `point` onto the track
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if a writer panicked.
    pub fn is_unplaceable(&self, point: &StationPoint) -> Result<bool, Error> {
        let unplaceable = self.unplaceable.read().map_err(|_| Error::LockPoisoned)?;
        Ok(unplaceable.contains(&point.key()))
    }

    /// Shortest route between two stations, each optionally narrowed to a
    /// platform.
    ///
    /// `Ok(None)` if either station is unknown or no route exists.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the network lock is poisoned, or any other
    /// error that is not [recoverable](Error::is_recoverable).
    pub fn find_shortest_path(
        &self,
        origin: &Crs,
        origin_platform: Option<&Platform>,
        destination: &Crs,
        destination_platform: Option<&Platform>,
    ) -> Result<Option<NetworkPath>, Error> {
        let sources = self.stations.station_points(origin, origin_platform);
        let targets = self.stations.station_points(destination, destination_platform);
        if sources.is_empty() || targets.is_empty() {
            debug!("Unknown station in {origin} -> {destination}");
            return Ok(None);
        }

        let network = self.ensure_inserted(sources.iter().chain(&targets))?;
        find_path(&network, &sources, &targets, &self.search)
    }

    /// Route through every call of a leg.
    ///
    /// `Ok(None)` if fewer than two calls are given, a station is unknown, or
    /// two adjacent calls cannot be joined.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the network lock is poisoned, or any other
    /// error that is not [recoverable](Error::is_recoverable).
    pub fn build_leg_line(&self, calls: &[LegCall]) -> Result<Option<LegLine>, Error> {
        let points: Vec<Vec<StationPoint>> = calls
            .iter()
            .map(|call| self.stations.station_points(&call.crs, call.platform.as_ref()))
            .collect();
        if points.len() < 2 || points.iter().any(Vec::is_empty) {
            return Ok(None);
        }

        let network = self.ensure_inserted(points.iter().flatten())?;
        build_leg_line(&network, &points, &self.search)
    }

    /// Insert every point that is not in the network yet and hand back a read
    /// guard. Points that cannot be snapped are logged, remembered and left
    /// out.
    fn ensure_inserted<'a>(
        &self,
        points: impl Iterator<Item = &'a StationPoint>,
    ) -> Result<RwLockReadGuard<'_, RailNetwork>, Error> {
        let points: Vec<StationPoint> = points.copied().collect();
        {
            let network = self.network()?;
            let unplaceable = self.unplaceable.read().map_err(|_| Error::LockPoisoned)?;
            if points
                .iter()
                .all(|point| network.has_node(point.key()) || unplaceable.contains(&point.key()))
            {
                return Ok(network);
            }
        }

        {
            let mut network = self.network.write().map_err(|_| Error::LockPoisoned)?;
            let mut unplaceable = self.unplaceable.write().map_err(|_| Error::LockPoisoned)?;
            // Another writer may have dealt with some of them meanwhile
            let missing: Vec<StationPoint> = points
                .into_iter()
                .filter(|point| {
                    !network.has_node(point.key()) && !unplaceable.contains(&point.key())
                })
                .collect();
            let placed = insert_station_points(&mut network, &missing, &self.insertion)?;
            unplaceable.extend(
                missing
                    .iter()
                    .map(StationPoint::key)
                    .filter(|&key| !network.has_node(key)),
            );
            debug!(
                "Placed {} of {} missing station points",
                placed.len(),
                missing.len()
            );
        }

        self.network()
    }
}
