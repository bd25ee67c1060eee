//! Rail network components - nodes, edges, and the records they are built from

use geo::{Coord, Euclidean, Length, LineString, Point};

use crate::NodeKey;

/// Rail network node
#[derive(Debug, Clone)]
pub struct NetworkNode {
    /// OSM id, or the station key once a station has been placed on the node
    pub key: NodeKey,
    /// WGS84 position (x = longitude, y = latitude)
    pub geometry: Point<f64>,
    /// National Grid position in metres
    pub planar: Coord<f64>,
    /// Added at runtime rather than loaded from the network file
    pub inserted: bool,
}

/// Directed track segment between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEdge {
    /// Planar track geometry ordered from source to target
    pub geometry: Option<LineString<f64>>,
    /// Length in metres
    pub length: f64,
    /// Highest posted speed, units as found in the source data
    pub max_speed: Option<f64>,
    pub electrified: Option<String>,
}

impl NetworkEdge {
    /// Track geometry, or a straight line between the endpoints for edges
    /// loaded without one
    pub fn line(&self, source: Coord<f64>, target: Coord<f64>) -> LineString<f64> {
        self.geometry
            .clone()
            .unwrap_or_else(|| LineString::new(vec![source, target]))
    }

    /// A piece of this edge along `geometry`, keeping its speed and
    /// electrification
    pub(crate) fn part(&self, geometry: LineString<f64>) -> Self {
        Self {
            length: Euclidean.length(&geometry),
            geometry: Some(geometry),
            max_speed: self.max_speed,
            electrified: self.electrified.clone(),
        }
    }
}

/// A node as read from a network file
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub key: NodeKey,
    /// WGS84 position
    pub geometry: Point<f64>,
}

/// An edge as read from a network file
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub source: NodeKey,
    pub target: NodeKey,
    /// WGS84 geometry
    pub geometry: Option<LineString<f64>>,
    /// Metres; measured from the geometry when absent
    pub length: Option<f64>,
    pub max_speed: Option<f64>,
    pub electrified: Option<String>,
}
