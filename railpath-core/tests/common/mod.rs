//! On-disk fixture: a short main line with a bend, and a separate island of
//! track, laid out in metres and written as GraphML, CSV and TOML.

#![allow(dead_code)]

use std::{fmt::Write as _, path::PathBuf};

use geo::{Coord, Point};
use railpath_core::projection::to_geographic;
use tempfile::TempDir;

pub const ORIGIN: Coord<f64> = Coord {
    x: 525_000.0,
    y: 180_000.0,
};

pub fn geographic(dx: f64, dy: f64) -> Point<f64> {
    to_geographic(Coord {
        x: ORIGIN.x + dx,
        y: ORIGIN.y + dy,
    })
    .unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// (id, dx, dy)
pub const NODES: [(u64, f64, f64); 6] = [
    (10, 0.0, 0.0),
    (11, 1000.0, 0.0),
    (12, 2000.0, 0.0),
    (13, 3000.0, 0.0),
    (20, 0.0, 5000.0),
    (21, 800.0, 5000.0),
];

struct Track {
    source: u64,
    target: u64,
    via: &'static [(f64, f64)],
    maxspeed: Option<&'static str>,
    length: Option<f64>,
}

const TRACKS: [Track; 4] = [
    Track {
        source: 10,
        target: 11,
        via: &[(500.0, 100.0)],
        maxspeed: Some("['50 mph', '75 mph']"),
        length: None,
    },
    Track {
        source: 11,
        target: 12,
        via: &[],
        maxspeed: Some("60"),
        length: Some(1000.0),
    },
    Track {
        source: 12,
        target: 13,
        via: &[(2500.0, 0.0)],
        maxspeed: None,
        length: None,
    },
    Track {
        source: 20,
        target: 21,
        via: &[],
        maxspeed: None,
        length: None,
    },
];

/// (crs, platform, dx, dy)
pub const STATIONS: [(&str, &str, f64, f64); 5] = [
    ("AAA", "1", 200.0, 40.0),
    ("AAA", "2", 300.0, 60.0),
    ("BBB", "", 1000.0, 0.0),
    ("CCC", "", 2700.0, 50.0),
    ("DDD", "", 400.0, 5000.0),
];

fn offset(id: u64) -> (f64, f64) {
    NODES
        .iter()
        .find(|(node, _, _)| *node == id)
        .map(|&(_, dx, dy)| (dx, dy))
        .unwrap()
}

fn wkt(points: &[(f64, f64)]) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|&(dx, dy)| {
            let point = geographic(dx, dy);
            format!("{} {}", point.x(), point.y())
        })
        .collect();
    format!("LINESTRING ({})", coords.join(", "))
}

pub fn graphml() -> String {
    let mut document = String::from(
        r#"<?xml version='1.0' encoding='utf-8'?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="y" attr.type="string" />
  <key id="d1" for="node" attr.name="x" attr.type="string" />
  <key id="d2" for="edge" attr.name="maxspeed" attr.type="string" />
  <key id="d3" for="edge" attr.name="electrified" attr.type="string" />
  <key id="d4" for="edge" attr.name="length" attr.type="string" />
  <key id="d5" for="edge" attr.name="geometry" attr.type="string" />
  <graph edgedefault="directed">
"#,
    );

    for (id, dx, dy) in NODES {
        let point = geographic(dx, dy);
        writeln!(
            document,
            r#"    <node id="{id}"><data key="d0">{}</data><data key="d1">{}</data></node>"#,
            point.y(),
            point.x()
        )
        .unwrap();
    }

    for track in &TRACKS {
        for (source, target) in [(track.source, track.target), (track.target, track.source)] {
            let mut points = vec![offset(source)];
            if source == track.source {
                points.extend(track.via);
            } else {
                points.extend(track.via.iter().rev());
            }
            points.push(offset(target));

            write!(document, r#"    <edge source="{source}" target="{target}">"#).unwrap();
            if let Some(maxspeed) = track.maxspeed {
                write!(document, r#"<data key="d2">{maxspeed}</data>"#).unwrap();
            }
            write!(document, r#"<data key="d3">contact_line</data>"#).unwrap();
            if let Some(length) = track.length {
                write!(document, r#"<data key="d4">{length}</data>"#).unwrap();
            }
            if !track.via.is_empty() {
                write!(document, r#"<data key="d5">{}</data>"#, wkt(&points)).unwrap();
            }
            document.push_str("</edge>\n");
        }
    }

    document.push_str("  </graph>\n</graphml>\n");
    document
}

pub fn stations_csv() -> String {
    let mut csv = String::from("crs,platform,latitude,longitude\n");
    for (crs, platform, dx, dy) in STATIONS {
        let point = geographic(dx, dy);
        writeln!(csv, "{crs},{platform},{},{}", point.y(), point.x()).unwrap();
    }
    csv
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: PathBuf,
}

/// Write the network, stations and a config referring to both by relative
/// path
pub fn fixture(extra_config: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("network.graphml"), graphml()).unwrap();
    std::fs::write(dir.path().join("stations.csv"), stations_csv()).unwrap();

    let config = dir.path().join("railpath.toml");
    std::fs::write(
        &config,
        format!(
            "graph_path = \"network.graphml\"\nstations_path = \"stations.csv\"\n{extra_config}"
        ),
    )
    .unwrap();

    Fixture { dir, config }
}
