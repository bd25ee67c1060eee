// Re-export key components
pub use crate::algo::{InsertionOptions, insert_station_point, insert_station_points};
pub use crate::engine::RouteEngine;
pub use crate::loading::{NetworkConfig, create_rail_network, create_route_engine};
pub use crate::model::{
    Crs, EdgeWeighting, LegCall, Platform, RailNetwork, StationLookup, StationNodeId,
    StationPoint, StationPoints,
};
pub use crate::routing::{LegLine, NetworkPath, SearchOptions};

// Core types
pub use crate::Error;
pub use crate::NodeKey;
