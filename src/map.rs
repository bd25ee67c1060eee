//! Map output for routed lines: WKT and `GeoJSON` features in WGS84.

use geo::LineString;
use geojson::{Feature, Geometry, GeometryValue};
use railpath_core::{LegLine, NetworkPath, StationPoint};
use serde_json::{Value, json};
use wkt::ToWkt;

use crate::Error;

/// A routed line that can be drawn on a map
pub trait MapLine {
    fn line(&self) -> &LineString<f64>;

    /// Feature properties describing the line
    fn properties(&self) -> Value;
}

fn call_properties(point: &StationPoint) -> Value {
    json!({
        "crs": point.crs.to_string(),
        "platform": point.platform.map(|platform| platform.to_string()),
        "node": point.key(),
    })
}

impl MapLine for NetworkPath {
    fn line(&self) -> &LineString<f64> {
        &self.line
    }

    fn properties(&self) -> Value {
        json!({
            "kind": "path",
            "from": self.source.node_id().to_string(),
            "to": self.target.node_id().to_string(),
            "length_m": self.length,
            "calls": [call_properties(&self.source), call_properties(&self.target)],
        })
    }
}

impl MapLine for LegLine {
    fn line(&self) -> &LineString<f64> {
        &self.line
    }

    fn properties(&self) -> Value {
        let from = self.calls.first().map(|call| call.node_id().to_string());
        let to = self.calls.last().map(|call| call.node_id().to_string());
        json!({
            "kind": "leg",
            "from": from,
            "to": to,
            "length_m": self.length,
            "calls": self.calls.iter().map(call_properties).collect::<Vec<_>>(),
        })
    }
}

pub fn to_wkt(line: &impl MapLine) -> String {
    line.line().to_wkt().to_string()
}

/// # Errors
///
/// Returns an error if the feature cannot be assembled
pub fn to_feature(line: &impl MapLine) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeometryValue::from(line.line()));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": line.properties(),
    });

    serde_json::from_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

/// # Errors
///
/// Returns an error if the feature cannot be assembled or serialized
pub fn to_geojson_string(line: &impl MapLine) -> Result<String, Error> {
    serde_json::to_string(&to_feature(line)?).map_err(|e| Error::GeoJsonError(e.to_string()))
}
