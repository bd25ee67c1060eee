use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid graph file: {0}")]
    GraphFormat(String),
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::DeError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Projection error: {0}")]
    Projection(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Could not snap point onto the network: {0}")]
    GeometrySnap(String),
    #[error("Line strings are not contiguous")]
    NotContiguous,
    #[error("Network lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Whether the error affects a single candidate only, so a search may
    /// carry on with the next one
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::GeometrySnap(_) | Error::NotContiguous)
    }
}
