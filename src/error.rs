use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] railpath_core::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
