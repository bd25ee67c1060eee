//! Fixtures shared by unit tests. Networks are laid out in metres around a
//! point near King's Cross and converted back to WGS84 for loading.

use geo::{Coord, Point};

use crate::{
    NodeKey,
    model::{Crs, EdgeRecord, NodeRecord, Platform, RailNetwork, StationPoint, WeightOptions},
    projection::to_geographic,
};

pub(crate) const ORIGIN: Coord<f64> = Coord {
    x: 530_000.0,
    y: 183_000.0,
};

pub(crate) fn geographic(dx: f64, dy: f64) -> Point<f64> {
    to_geographic(Coord {
        x: ORIGIN.x + dx,
        y: ORIGIN.y + dy,
    })
    .unwrap()
}

/// Network of straight edges between nodes given as offsets from
/// [`ORIGIN`]. Every edge is added in both directions when `both` is set.
pub(crate) fn network_from_offsets(
    nodes: &[(NodeKey, f64, f64)],
    edges: &[(NodeKey, NodeKey, Option<f64>)],
    both: bool,
) -> RailNetwork {
    let nodes = nodes
        .iter()
        .map(|&(key, dx, dy)| NodeRecord {
            key,
            geometry: geographic(dx, dy),
        })
        .collect();
    let edges = edges
        .iter()
        .flat_map(|&(source, target, max_speed)| {
            let forward = (source, target, max_speed);
            let backward = both.then_some((target, source, max_speed));
            std::iter::once(forward).chain(backward)
        })
        .map(|(source, target, max_speed)| EdgeRecord {
            source,
            target,
            geometry: None,
            length: None,
            max_speed,
            electrified: None,
        })
        .collect();
    RailNetwork::from_parts(nodes, edges, WeightOptions::default()).unwrap()
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum SquareEdges {
    Forward,
    Both,
}

/// 100 m square of nodes 1 to 4, anticlockwise from [`ORIGIN`]
pub(crate) fn planar_network(edges: SquareEdges) -> RailNetwork {
    network_from_offsets(
        &[(1, 0.0, 0.0), (2, 100.0, 0.0), (3, 100.0, 100.0), (4, 0.0, 100.0)],
        &[(1, 2, None), (2, 3, None), (3, 4, None), (4, 1, None)],
        matches!(edges, SquareEdges::Both),
    )
}

pub(crate) fn station(crs: &str, platform: Option<&str>, dx: f64, dy: f64) -> StationPoint {
    StationPoint::new(
        Crs::parse(crs).unwrap(),
        platform.map(|p| Platform::parse(p).unwrap()),
        geographic(dx, dy),
    )
}
