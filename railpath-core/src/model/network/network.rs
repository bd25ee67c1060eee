use geo::{Coord, Distance, Euclidean, Length, LineString, Point};
use hashbrown::HashMap;
use log::debug;
use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::EdgeRef,
};
use rayon::prelude::*;
use rstar::{
    PointDistance, RTree,
    primitives::{GeomWithData, Line},
};
use serde::Deserialize;

use super::components::{EdgeRecord, NetworkEdge, NetworkNode, NodeRecord};
use crate::{
    Error, NodeKey,
    geometry::reversed,
    model::identity::is_station_key,
    projection::to_planar,
};

/// One straight piece of an edge's planar geometry, tagged with its edge
pub type IndexedSegment = GeomWithData<Line<[f64; 2]>, EdgeIndex>;

/// How an edge's length and speed combine into a search cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeWeighting {
    /// `length / speed`
    #[default]
    Linear,
    /// `length / speed²`, which favours fast lines more strongly
    Quadratic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightOptions {
    pub weighting: EdgeWeighting,
    /// Speed assumed for edges without a usable maximum speed
    pub default_speed: f64,
}

impl Default for WeightOptions {
    fn default() -> Self {
        Self {
            weighting: EdgeWeighting::Linear,
            default_speed: 1.0,
        }
    }
}

/// Result of a nearest-edge query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestEdge {
    pub edge: EdgeIndex,
    pub source: NodeIndex,
    pub target: NodeIndex,
    /// Planar distance from the query point to the edge, in metres
    pub distance: f64,
}

/// Rail network graph with a spatial index over its edge geometry
#[derive(Debug, Clone)]
pub struct RailNetwork {
    graph: StableDiGraph<NetworkNode, NetworkEdge>,
    /// Every key a node answers to, including aliases
    keys: HashMap<NodeKey, NodeIndex>,
    segments: RTree<IndexedSegment>,
    weights: WeightOptions,
}

impl RailNetwork {
    /// Empty network
    pub fn new(weights: WeightOptions) -> Self {
        Self {
            graph: StableDiGraph::default(),
            keys: HashMap::new(),
            segments: RTree::new(),
            weights,
        }
    }

    /// Build a network from loaded node and edge records.
    ///
    /// Geometry is projected into the planar frame and edge lines are
    /// oriented from source to target with their ends pinned to the node
    /// positions. Missing lengths are measured from the planar geometry.
    ///
    /// # Errors
    ///
    /// [`Error::GraphFormat`] on duplicate node keys or edges referencing
    /// unknown nodes, [`Error::Projection`] on coordinates that cannot be
    /// projected.
    pub fn from_parts(
        nodes: Vec<NodeRecord>,
        edges: Vec<EdgeRecord>,
        weights: WeightOptions,
    ) -> Result<Self, Error> {
        let mut network = Self::new(weights);

        let nodes = nodes
            .into_par_iter()
            .map(|record| {
                Ok(NetworkNode {
                    key: record.key,
                    planar: to_planar(record.geometry)?,
                    geometry: record.geometry,
                    inserted: false,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        for node in nodes {
            let key = node.key;
            if network.keys.contains_key(&key) {
                return Err(Error::GraphFormat(format!("duplicate node {key}")));
            }
            let index = network.graph.add_node(node);
            network.keys.insert(key, index);
        }

        let projected = edges
            .into_par_iter()
            .map(|record| {
                let geometry = record
                    .geometry
                    .as_ref()
                    .map(|line| {
                        line.coords()
                            .map(|&coord| to_planar(Point::from(coord)))
                            .collect::<Result<LineString<f64>, Error>>()
                    })
                    .transpose()?;
                Ok((record, geometry))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        for (record, geometry) in projected {
            let (source, target) = match (
                network.keys.get(&record.source),
                network.keys.get(&record.target),
            ) {
                (Some(&source), Some(&target)) => (source, target),
                _ => {
                    return Err(Error::GraphFormat(format!(
                        "edge {} -> {} references an unknown node",
                        record.source, record.target
                    )));
                }
            };
            let (from, to) = (network.graph[source].planar, network.graph[target].planar);

            let geometry = geometry
                .filter(|line| line.0.len() >= 2)
                .map(|line| pin_to_endpoints(line, from, to));
            let length = record
                .length
                .filter(|length| length.is_finite() && *length >= 0.0)
                .unwrap_or_else(|| match &geometry {
                    Some(line) => Euclidean.length(line),
                    None => Euclidean.distance(from, to),
                });

            network.graph.add_edge(
                source,
                target,
                NetworkEdge {
                    geometry,
                    length,
                    max_speed: record.max_speed,
                    electrified: record.electrified,
                },
            );
        }

        let segments = network
            .graph
            .edge_indices()
            .flat_map(|edge| network.edge_segments(edge))
            .collect();
        network.segments = RTree::bulk_load(segments);

        Ok(network)
    }

    pub fn weights(&self) -> WeightOptions {
        self.weights
    }

    /// Underlying graph, read-only
    pub fn graph(&self) -> &StableDiGraph<NetworkNode, NetworkEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, key: NodeKey) -> bool {
        self.keys.contains_key(&key)
    }

    pub fn node_index(&self, key: NodeKey) -> Option<NodeIndex> {
        self.keys.get(&key).copied()
    }

    pub fn node(&self, key: NodeKey) -> Option<&NetworkNode> {
        self.node_index(key)
            .and_then(|index| self.graph.node_weight(index))
    }

    /// Whether any edge runs from `source` to `target`
    pub fn has_edge(&self, source: NodeKey, target: NodeKey) -> bool {
        self.edges_between(source, target).next().is_some()
    }

    /// All parallel edges from `source` to `target`
    pub fn edges_between(
        &self,
        source: NodeKey,
        target: NodeKey,
    ) -> impl Iterator<Item = &NetworkEdge> + '_ {
        let endpoints = self.node_index(source).zip(self.node_index(target));
        endpoints.into_iter().flat_map(move |(source, target)| {
            self.graph
                .edges_directed(source, Direction::Outgoing)
                .filter(move |edge| edge.target() == target)
                .map(|edge| edge.weight())
        })
    }

    /// Search cost of an edge
    pub fn edge_weight(&self, edge: &NetworkEdge) -> f64 {
        let speed = edge
            .max_speed
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .unwrap_or(self.weights.default_speed);
        match self.weights.weighting {
            EdgeWeighting::Linear => edge.length / speed,
            EdgeWeighting::Quadratic => edge.length / (speed * speed),
        }
    }

    /// Cheapest of the parallel edges from `source` to `target`; the first
    /// one wins a tie
    pub fn cheapest_edge(
        &self,
        source: NodeIndex,
        target: NodeIndex,
    ) -> Option<(EdgeIndex, &NetworkEdge)> {
        let mut best: Option<(EdgeIndex, &NetworkEdge, f64)> = None;
        for edge in self.graph.edges(source) {
            if edge.target() != target {
                continue;
            }
            let cost = self.edge_weight(edge.weight());
            if best.is_none_or(|(_, _, best_cost)| cost < best_cost) {
                best = Some((edge.id(), edge.weight(), cost));
            }
        }
        best.map(|(index, edge, _)| (index, edge))
    }

    /// Planar line of an edge, straight between its nodes when it has no
    /// geometry
    pub fn edge_line(&self, edge: EdgeIndex) -> Option<LineString<f64>> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        let weight = self.graph.edge_weight(edge)?;
        Some(weight.line(self.graph[source].planar, self.graph[target].planar))
    }

    /// The edge whose geometry passes closest to a planar point
    pub fn nearest_edge(&self, point: Coord<f64>) -> Option<NearestEdge> {
        let query = [point.x, point.y];
        let nearest = self.segments.nearest_neighbor(&query)?;
        let (source, target) = self.graph.edge_endpoints(nearest.data)?;
        Some(NearestEdge {
            edge: nearest.data,
            source,
            target,
            distance: nearest.geom().distance_2(&query).sqrt(),
        })
    }

    pub(crate) fn add_node(&mut self, node: NetworkNode) -> NodeIndex {
        let key = node.key;
        let index = self.graph.add_node(node);
        self.keys.insert(key, index);
        index
    }

    /// Make `key` resolve to an existing node as well as its own key
    pub(crate) fn add_key_alias(&mut self, key: NodeKey, node: NodeIndex) {
        self.keys.insert(key, node);
    }

    /// Give a node a station key. An infrastructure node drops its old key;
    /// a node that is already a station keeps its key and gains an alias.
    pub(crate) fn rekey_node(&mut self, node: NodeIndex, key: NodeKey) {
        let Some(weight) = self.graph.node_weight_mut(node) else {
            return;
        };
        if is_station_key(weight.key) {
            self.add_key_alias(key, node);
            return;
        }

        let previous = std::mem::replace(&mut weight.key, key);
        if self.keys.get(&previous) == Some(&node) {
            self.keys.remove(&previous);
        }
        self.keys.insert(key, node);
        debug!("Node {previous} now answers to {key}");
    }

    pub(crate) fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        edge: NetworkEdge,
    ) -> EdgeIndex {
        let index = self.graph.add_edge(source, target, edge);
        for segment in self.edge_segments(index) {
            self.segments.insert(segment);
        }
        index
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeIndex) -> Option<NetworkEdge> {
        for segment in self.edge_segments(edge) {
            self.segments.remove(&segment);
        }
        self.graph.remove_edge(edge)
    }

    fn edge_segments(&self, edge: EdgeIndex) -> Vec<IndexedSegment> {
        self.edge_line(edge)
            .map(|line| {
                line.lines()
                    .filter(|segment| segment.start != segment.end)
                    .map(|segment| {
                        GeomWithData::new(
                            Line::new(
                                [segment.start.x, segment.start.y],
                                [segment.end.x, segment.end.y],
                            ),
                            edge,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for RailNetwork {
    fn default() -> Self {
        Self::new(WeightOptions::default())
    }
}

/// Orient a line from `from` to `to` and replace its ends with the exact node
/// positions
fn pin_to_endpoints(line: LineString<f64>, from: Coord<f64>, to: Coord<f64>) -> LineString<f64> {
    let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else {
        return line;
    };
    let mut line = if Euclidean.distance(first, from) + Euclidean.distance(last, to)
        > Euclidean.distance(last, from) + Euclidean.distance(first, to)
    {
        reversed(&line)
    } else {
        line
    };
    let end = line.0.len() - 1;
    line.0[0] = from;
    line.0[end] = to;
    line
}
