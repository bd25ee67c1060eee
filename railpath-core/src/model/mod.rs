//! Data model for rail network routing
//!
//! Contains station identities, boarding points and the rail network graph.

pub mod identity;
pub mod network;
pub mod station;

pub use identity::{Crs, Platform, StationNodeId, is_station_key};
pub use network::{
    EdgeRecord, EdgeWeighting, NearestEdge, NetworkEdge, NetworkNode, NodeRecord, RailNetwork,
    WeightOptions,
};
pub use station::{LegCall, StationLookup, StationPoint, StationPoints};
