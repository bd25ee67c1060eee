//! Rail network graph model

pub mod components;
pub mod network;

pub use components::{EdgeRecord, NetworkEdge, NetworkNode, NodeRecord};
pub use network::{EdgeWeighting, IndexedSegment, NearestEdge, RailNetwork, WeightOptions};
