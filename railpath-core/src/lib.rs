//! Rail network pathfinding with station points placed onto the track on
//! demand.
//!
//! A [`RailNetwork`] is loaded once from a GraphML file and projected onto the
//! British National Grid. Station boarding points are inserted into it the
//! first time a route touches them, splitting the nearest track where needed.
//! The [`RouteEngine`] ties the two together behind a single-writer lock.

pub mod algo;
pub mod engine;
mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod projection;
pub mod routing;

#[cfg(test)]
mod testing;

pub use engine::RouteEngine;
pub use error::Error;
pub use loading::{NetworkConfig, create_rail_network, create_route_engine};
pub use model::{Crs, LegCall, Platform, RailNetwork, StationLookup, StationPoint, StationPoints};
pub use routing::{LegLine, NetworkPath, SearchOptions};

/// Integer identity of a network node: an OSM node id, or a station key
pub type NodeKey = u64;
