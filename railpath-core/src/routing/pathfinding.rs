//! Route search between station points

use geo::{Euclidean, Length, LineString};
use itertools::iproduct;
use log::{debug, trace, warn};

use super::dijkstra::shortest_path;
use crate::{
    Error,
    geometry::merge_lines,
    model::{RailNetwork, StationPoint},
    projection::line_to_geographic,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Give up a single search after settling this many nodes
    pub max_explored_nodes: Option<usize>,
}

/// Route found between two station points
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPath {
    pub source: StationPoint,
    pub target: StationPoint,
    /// Track followed, in WGS84
    pub line: LineString<f64>,
    /// Length of the track followed, in metres
    pub length: f64,
}

/// A route in the planar frame
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlanarRoute {
    pub(crate) line: LineString<f64>,
    pub(crate) length: f64,
}

/// Cheapest route between the network nodes of two station points.
///
/// `Ok(None)` if either point is not in the network, both resolve to the same
/// node, or there is no route.
///
/// # Errors
///
/// [`Error::NotContiguous`] if the edge lines along the route do not join.
pub(crate) fn route_between(
    network: &RailNetwork,
    source: &StationPoint,
    target: &StationPoint,
    options: &SearchOptions,
) -> Result<Option<PlanarRoute>, Error> {
    let (Some(start), Some(end)) = (
        network.node_index(source.key()),
        network.node_index(target.key()),
    ) else {
        return Ok(None);
    };
    if start == end {
        return Ok(None);
    }

    let Some(path) = shortest_path(network, start, end, options.max_explored_nodes) else {
        return Ok(None);
    };

    let lines = path
        .nodes
        .windows(2)
        .map(|pair| {
            network
                .cheapest_edge(pair[0], pair[1])
                .and_then(|(edge, _)| network.edge_line(edge))
                .ok_or(Error::NotContiguous)
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let line = merge_lines(&lines)?;

    Ok(Some(PlanarRoute {
        length: Euclidean.length(&line),
        line,
    }))
}

/// Shortest route between any of the source points and any of the target
/// points.
///
/// Every pair is searched in order and the route with the smallest length is
/// kept, the earlier pair winning a tie. Pairs whose route cannot be
/// reconstructed are skipped. Points must already be in the network.
///
/// `Ok(None)` if no pair has a route.
///
/// # Errors
///
/// Any error that is not [recoverable](Error::is_recoverable), such as a
/// route that cannot be projected back to WGS84.
pub fn find_path(
    network: &RailNetwork,
    sources: &[StationPoint],
    targets: &[StationPoint],
    options: &SearchOptions,
) -> Result<Option<NetworkPath>, Error> {
    let mut best: Option<(PlanarRoute, &StationPoint, &StationPoint)> = None;

    for (source, target) in iproduct!(sources, targets) {
        match route_between(network, source, target, options) {
            Ok(Some(route)) => {
                trace!(
                    "{} -> {}: {:.0} m",
                    source.node_id(),
                    target.node_id(),
                    route.length
                );
                if best
                    .as_ref()
                    .is_none_or(|(current, _, _)| route.length < current.length)
                {
                    best = Some((route, source, target));
                }
            }
            Ok(None) => trace!("{} -> {}: no route", source.node_id(), target.node_id()),
            Err(err) if err.is_recoverable() => warn!(
                "Skipping {} -> {}: {err}",
                source.node_id(),
                target.node_id()
            ),
            Err(err) => return Err(err),
        }
    }

    let Some((route, source, target)) = best else {
        return Ok(None);
    };
    let line = line_to_geographic(&route.line)?;
    debug!(
        "Route {} -> {} is {:.0} m",
        source.node_id(),
        target.node_id(),
        route.length
    );

    Ok(Some(NetworkPath {
        source: *source,
        target: *target,
        line,
        length: route.length,
    }))
}

#[cfg(test)]
mod tests {
    use geo::{Distance, Haversine, Point};

    use super::*;
    use crate::{
        algo::{InsertionOptions, insert_station_points},
        testing::{network_from_offsets, station},
    };

    /// A line of track with a loop: 1 - 2 - 3 - 4 and a detour 2 - 5 - 3
    fn track() -> RailNetwork {
        network_from_offsets(
            &[
                (1, 0.0, 0.0),
                (2, 1000.0, 0.0),
                (3, 2000.0, 0.0),
                (4, 3000.0, 0.0),
                (5, 1500.0, 800.0),
            ],
            &[
                (1, 2, None),
                (2, 3, None),
                (3, 4, None),
                (2, 5, None),
                (5, 3, None),
            ],
            true,
        )
    }

    fn placed(network: &mut RailNetwork, points: &[StationPoint]) -> Vec<StationPoint> {
        insert_station_points(network, points, &InsertionOptions::default()).unwrap()
    }

    #[test]
    fn finds_route_between_split_stations() {
        let mut network = track();
        let sources = placed(&mut network, &[station("AAA", None, 500.0, 10.0)]);
        let targets = placed(&mut network, &[station("BBB", None, 2500.0, -10.0)]);

        let path = find_path(&network, &sources, &targets, &SearchOptions::default())
            .unwrap()
            .unwrap();
        assert!((path.length - 2000.0).abs() < 0.05);
        assert_eq!(path.source, sources[0]);
        assert_eq!(path.target, targets[0]);

        let start: Point<f64> = path.line.0[0].into();
        let end: Point<f64> = path.line.0[path.line.0.len() - 1].into();
        assert!(Haversine.distance(start, sources[0].geometry) < 11.0);
        assert!(Haversine.distance(end, targets[0].geometry) < 11.0);
    }

    #[test]
    fn picks_shortest_platform_pair() {
        let mut network = track();
        let sources = placed(
            &mut network,
            &[station("AAA", Some("1"), 200.0, 0.0), station("AAA", Some("2"), 800.0, 0.0)],
        );
        let targets = placed(
            &mut network,
            &[station("BBB", Some("1"), 2900.0, 0.0), station("BBB", Some("2"), 2100.0, 0.0)],
        );

        let path = find_path(&network, &sources, &targets, &SearchOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.source, sources[1]);
        assert_eq!(path.target, targets[1]);
        assert!((path.length - 1300.0).abs() < 0.05);
    }

    #[test]
    fn same_node_is_no_route() {
        let mut network = track();
        let points = placed(&mut network, &[station("AAA", None, 500.0, 0.0)]);
        assert!(find_path(&network, &points, &points, &SearchOptions::default()).unwrap().is_none());
    }

    #[test]
    fn disconnected_stations_have_no_route() {
        let mut network = network_from_offsets(
            &[(1, 0.0, 0.0), (2, 100.0, 0.0), (3, 5000.0, 0.0), (4, 5100.0, 0.0)],
            &[(1, 2, None), (3, 4, None)],
            true,
        );
        let sources = placed(&mut network, &[station("AAA", None, 50.0, 0.0)]);
        let targets = placed(&mut network, &[station("BBB", None, 5050.0, 0.0)]);
        assert!(find_path(&network, &sources, &targets, &SearchOptions::default()).unwrap().is_none());
    }

    #[test]
    fn repeated_searches_agree() {
        let mut network = track();
        let sources = placed(&mut network, &[station("AAA", None, 500.0, 0.0)]);
        let targets = placed(&mut network, &[station("BBB", None, 2500.0, 0.0)]);
        let options = SearchOptions::default();

        let first = find_path(&network, &sources, &targets, &options).unwrap().unwrap();
        for _ in 0..5 {
            let again = find_path(&network, &sources, &targets, &options).unwrap();
            assert_eq!(again.as_ref(), Some(&first));
        }
    }

    #[test]
    fn missing_points_are_skipped() {
        let network = track();
        let sources = [station("AAA", None, 500.0, 0.0)];
        let targets = [station("BBB", None, 2500.0, 0.0)];
        assert!(find_path(&network, &sources, &targets, &SearchOptions::default()).unwrap().is_none());
    }
}
