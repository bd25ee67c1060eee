//! Routing over the rail network

mod dijkstra;
pub mod leg_line;
pub mod pathfinding;

pub use leg_line::{LegLine, build_leg_line};
pub use pathfinding::{NetworkPath, SearchOptions, find_path};
