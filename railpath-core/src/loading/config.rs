use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    Error,
    algo::InsertionOptions,
    model::{EdgeWeighting, WeightOptions},
    routing::SearchOptions,
};

/// Configuration for loading a rail network and searching it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// GraphML rail network
    pub graph_path: PathBuf,
    /// CSV of station boarding points (`crs,platform,latitude,longitude`)
    #[serde(default)]
    pub stations_path: Option<PathBuf>,
    #[serde(default)]
    pub weighting: EdgeWeighting,
    /// Speed assumed for edges without a maximum speed
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    /// Metres within which a station lands on an existing node
    #[serde(default = "default_endpoint_tolerance")]
    pub endpoint_tolerance: f64,
    /// Metres of slack allowed when splitting an edge
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: f64,
    #[serde(default)]
    pub max_explored_nodes: Option<usize>,
}

fn default_speed() -> f64 {
    WeightOptions::default().default_speed
}

fn default_endpoint_tolerance() -> f64 {
    InsertionOptions::default().endpoint_tolerance
}

fn default_snap_tolerance() -> f64 {
    InsertionOptions::default().snap_tolerance
}

impl NetworkConfig {
    /// Defaults for everything but the network file
    pub fn new(graph_path: impl Into<PathBuf>) -> Self {
        Self {
            graph_path: graph_path.into(),
            stations_path: None,
            weighting: EdgeWeighting::default(),
            default_speed: default_speed(),
            endpoint_tolerance: default_endpoint_tolerance(),
            snap_tolerance: default_snap_tolerance(),
            max_explored_nodes: None,
        }
    }

    #[must_use]
    pub fn with_stations(mut self, stations_path: impl Into<PathBuf>) -> Self {
        self.stations_path = Some(stations_path.into());
        self
    }

    /// Parse a TOML document. Relative paths are kept as written.
    ///
    /// # Errors
    ///
    /// [`Error::TomlError`] if the document is malformed or has unknown keys.
    pub fn from_toml_str(document: &str) -> Result<Self, Error> {
        Ok(toml::from_str(document)?)
    }

    /// Read a TOML file. Relative paths inside it are resolved against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] if the file cannot be read, [`Error::TomlError`] if
    /// it is malformed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.graph_path = base.join(&config.graph_path);
        config.stations_path = config.stations_path.map(|stations| base.join(stations));
        Ok(config)
    }

    /// # Errors
    ///
    /// [`Error::Configuration`] if an input file is missing or a numeric
    /// setting is not positive and finite.
    pub fn validate(&self) -> Result<(), Error> {
        for path in std::iter::once(&self.graph_path).chain(&self.stations_path) {
            if !path.is_file() {
                return Err(Error::Configuration(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
        }

        for (name, value) in [
            ("default_speed", self.default_speed),
            ("endpoint_tolerance", self.endpoint_tolerance),
            ("snap_tolerance", self.snap_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        Ok(())
    }

    pub fn weights(&self) -> WeightOptions {
        WeightOptions {
            weighting: self.weighting,
            default_speed: self.default_speed,
        }
    }

    pub fn insertion_options(&self) -> InsertionOptions {
        InsertionOptions {
            endpoint_tolerance: self.endpoint_tolerance,
            snap_tolerance: self.snap_tolerance,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_explored_nodes: self.max_explored_nodes,
        }
    }
}
