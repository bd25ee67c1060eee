//! This module is responsible for loading the rail network and station data
//! and building a route engine over them.

mod builder;
mod config;
mod graphml;
mod stations;

pub use builder::{create_rail_network, create_route_engine};
pub use config::NetworkConfig;
pub use graphml::{load_graphml, parse_graphml};
pub use stations::{load_station_points, read_station_points};
