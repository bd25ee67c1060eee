//! GraphML rail networks as written by OSMnx

use std::path::Path;

use geo::{LineString, Point};
use hashbrown::HashMap;
use log::{info, warn};
use serde::Deserialize;
use wkt::TryFromWkt;

use crate::{
    Error, NodeKey,
    model::{EdgeRecord, NodeRecord},
};

#[derive(Debug, Deserialize)]
#[serde(rename = "graphml")]
struct GraphMlDocument {
    #[serde(rename = "key", default)]
    keys: Vec<KeyDeclaration>,
    graph: GraphElement,
}

/// `<key id="d4" for="node" attr.name="y"/>`
#[derive(Debug, Deserialize)]
struct KeyDeclaration {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@for", default)]
    domain: String,
    #[serde(rename = "@attr.name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GraphElement {
    #[serde(rename = "node", default)]
    nodes: Vec<NodeElement>,
    #[serde(rename = "edge", default)]
    edges: Vec<EdgeElement>,
}

#[derive(Debug, Deserialize)]
struct NodeElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "data", default)]
    data: Vec<DataElement>,
}

#[derive(Debug, Deserialize)]
struct EdgeElement {
    #[serde(rename = "@source")]
    source: String,
    #[serde(rename = "@target")]
    target: String,
    #[serde(rename = "data", default)]
    data: Vec<DataElement>,
}

#[derive(Debug, Deserialize)]
struct DataElement {
    #[serde(rename = "@key")]
    key: String,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Attribute names by key id, for one kind of element
struct Attributes<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> Attributes<'a> {
    fn new(keys: &'a [KeyDeclaration], domain: &str) -> Self {
        let names = keys
            .iter()
            .filter(|key| key.domain == domain || key.domain == "all" || key.domain.is_empty())
            .map(|key| (key.id.as_str(), key.name.as_str()))
            .collect();
        Self { names }
    }

    /// Value of the named attribute among an element's data
    fn get(&self, data: &'a [DataElement], name: &str) -> Option<&'a str> {
        data.iter()
            .find(|entry| self.names.get(entry.key.as_str()) == Some(&name))
            .map(|entry| entry.value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Read a GraphML rail network into node and edge records
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a GraphML network
/// with `x`/`y` node coordinates.
pub fn load_graphml(path: impl AsRef<Path>) -> Result<(Vec<NodeRecord>, Vec<EdgeRecord>), Error> {
    let path = path.as_ref();
    info!("Reading rail network: {}", path.display());
    parse_graphml(&std::fs::read_to_string(path)?)
}

/// Parse a GraphML document held in memory
///
/// # Errors
///
/// See [`load_graphml`].
pub fn parse_graphml(document: &str) -> Result<(Vec<NodeRecord>, Vec<EdgeRecord>), Error> {
    let document: GraphMlDocument = quick_xml::de::from_str(document)?;
    let node_attributes = Attributes::new(&document.keys, "node");
    let edge_attributes = Attributes::new(&document.keys, "edge");

    let nodes = document
        .graph
        .nodes
        .iter()
        .map(|node| {
            let coordinate = |name: &str| {
                node_attributes
                    .get(&node.data, name)
                    .and_then(|value| value.parse::<f64>().ok())
                    .ok_or_else(|| {
                        Error::GraphFormat(format!("node {} has no valid {name}", node.id))
                    })
            };
            Ok(NodeRecord {
                key: parse_node_id(&node.id)?,
                geometry: Point::new(coordinate("x")?, coordinate("y")?),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let edges = document
        .graph
        .edges
        .iter()
        .map(|edge| {
            let attribute = |name: &str| edge_attributes.get(&edge.data, name);
            let geometry = attribute("geometry")
                .map(|wkt| {
                    LineString::<f64>::try_from_wkt_str(wkt).map_err(|err| {
                        Error::GraphFormat(format!(
                            "edge {} -> {} has invalid geometry: {err}",
                            edge.source, edge.target
                        ))
                    })
                })
                .transpose()?;
            let length = attribute("length").and_then(|value| {
                let length = value.parse::<f64>().ok();
                if length.is_none() {
                    warn!(
                        "Ignoring length {value:?} of edge {} -> {}",
                        edge.source, edge.target
                    );
                }
                length
            });

            Ok(EdgeRecord {
                source: parse_node_id(&edge.source)?,
                target: parse_node_id(&edge.target)?,
                geometry,
                length,
                max_speed: attribute("maxspeed").and_then(parse_max_speed),
                electrified: attribute("electrified").map(str::to_string),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    info!(
        "Parsed {} nodes and {} edges",
        nodes.len(),
        edges.len()
    );
    Ok((nodes, edges))
}

fn parse_node_id(id: &str) -> Result<NodeKey, Error> {
    id.trim()
        .parse()
        .map_err(|_| Error::GraphFormat(format!("node id {id:?} is not an integer")))
}

/// Highest number in a `maxspeed` tag. OSMnx writes merged ways as a list,
/// e.g. `"['50 mph', '75 mph']"`.
fn parse_max_speed(value: &str) -> Option<f64> {
    value
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter_map(|token| token.parse::<f64>().ok())
        .filter(|speed| speed.is_finite() && *speed > 0.0)
        .max_by(f64::total_cmp)
}
