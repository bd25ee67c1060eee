//! Placing station points onto the rail network

use geo::{Distance, Euclidean};
use log::{debug, warn};
use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    Error, NodeKey,
    geometry::{project_onto_line, reversed, split_line_at},
    model::{NetworkNode, RailNetwork, StationPoint},
    projection::{to_geographic, to_planar},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionOptions {
    /// A point projecting this close to an edge end is placed on that node
    pub endpoint_tolerance: f64,
    /// Allowed length mismatch when splitting an edge
    pub snap_tolerance: f64,
}

impl Default for InsertionOptions {
    fn default() -> Self {
        Self {
            endpoint_tolerance: 0.001,
            snap_tolerance: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionKind {
    /// The key was already in the network
    Existing,
    /// An existing node took the key
    Relabelled,
    /// A new node was added by splitting the nearest edge
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub key: NodeKey,
    pub node: NodeIndex,
    pub kind: InsertionKind,
}

/// Make a station point reachable in the network under its station key.
///
/// The point is projected onto the nearest edge. If it lands on one of the
/// edge's ends, that node takes the key. Otherwise the edge is split at the
/// projected point: the edge and one reverse twin are replaced by four
/// edges running to and from a new node.
///
/// # Errors
///
/// [`Error::GeometrySnap`] if the network has no edges or the edge cannot be
/// split at the projected point, [`Error::Projection`] if the point cannot be
/// projected. The network is unchanged on error.
pub fn insert_station_point(
    network: &mut RailNetwork,
    point: &StationPoint,
    options: &InsertionOptions,
) -> Result<Insertion, Error> {
    let key = point.key();
    if let Some(node) = network.node_index(key) {
        return Ok(Insertion {
            key,
            node,
            kind: InsertionKind::Existing,
        });
    }

    let planar = to_planar(point.geometry)?;
    let nearest = network
        .nearest_edge(planar)
        .ok_or_else(|| Error::GeometrySnap("network has no edges".to_string()))?;
    let line = network
        .edge_line(nearest.edge)
        .ok_or_else(|| Error::GeometrySnap(format!("edge {:?} vanished", nearest.edge)))?;
    let projection = project_onto_line(&line, planar)
        .ok_or_else(|| Error::GeometrySnap("nearest edge has degenerate geometry".to_string()))?;

    let ends = [nearest.source, nearest.target].map(|end| (end, network.graph()[end].planar));
    for (end, position) in ends {
        if Euclidean.distance(projection.point, position) < options.endpoint_tolerance {
            network.rekey_node(end, key);
            debug!("Placed {} on existing node {end:?}", point.node_id());
            return Ok(Insertion {
                key,
                node: end,
                kind: InsertionKind::Relabelled,
            });
        }
    }

    let (first, second) = split_line_at(&line, &projection, options.snap_tolerance)?;
    let twin = reverse_twin(network, nearest.source, nearest.target, &line);
    let node = network.add_node(NetworkNode {
        key,
        geometry: to_geographic(projection.point)?,
        planar: projection.point,
        inserted: true,
    });

    let original = network
        .remove_edge(nearest.edge)
        .ok_or_else(|| Error::GeometrySnap(format!("edge {:?} vanished", nearest.edge)))?;
    if let Some(twin) = twin {
        network.remove_edge(twin);
    }

    let (source, target) = (nearest.source, nearest.target);
    network.add_edge(source, node, original.part(first.clone()));
    network.add_edge(node, source, original.part(reversed(&first)));
    network.add_edge(node, target, original.part(second.clone()));
    network.add_edge(target, node, original.part(reversed(&second)));

    debug!(
        "Placed {} {:.1} m along edge {source:?} -> {target:?}",
        point.node_id(),
        projection.along
    );
    Ok(Insertion {
        key,
        node,
        kind: InsertionKind::Split,
    })
}

/// Insert many points, logging and skipping those that cannot be snapped
/// onto the track. Returns the points that are now in the network.
///
/// # Errors
///
/// Stops at the first error that is not [recoverable](Error::is_recoverable),
/// such as a point that cannot be projected.
pub fn insert_station_points(
    network: &mut RailNetwork,
    points: &[StationPoint],
    options: &InsertionOptions,
) -> Result<Vec<StationPoint>, Error> {
    let mut placed = Vec::with_capacity(points.len());
    for point in points {
        match insert_station_point(network, point, options) {
            Ok(_) => placed.push(*point),
            Err(err) if err.is_recoverable() => warn!("Skipping {}: {err}", point.node_id()),
            Err(err) => return Err(err),
        }
    }
    Ok(placed)
}

/// The edge running back from `target` to `source`, preferring one that
/// retraces `line`
fn reverse_twin(
    network: &RailNetwork,
    source: NodeIndex,
    target: NodeIndex,
    line: &geo::LineString<f64>,
) -> Option<EdgeIndex> {
    let retraced = reversed(line);
    let mut fallback = None;
    for edge in network.graph().edges(target) {
        if edge.target() != source {
            continue;
        }
        if network.edge_line(edge.id()).as_ref() == Some(&retraced) {
            return Some(edge.id());
        }
        fallback.get_or_insert(edge.id());
    }
    fallback
}
