//! Map-facing facade over `railpath_core`: takes raw station codes and
//! platform labels, and renders the routes found as WKT or `GeoJSON`.

mod error;
pub mod map;
pub mod routing;

pub use error::Error;
pub use map::{MapLine, to_feature, to_geojson_string, to_wkt};
pub use routing::RouteMap;

pub use railpath_core::{LegLine, NetworkConfig, NetworkPath};
