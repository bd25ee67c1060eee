use log::info;

use super::config::NetworkConfig;
use super::graphml::load_graphml;
use super::stations::load_station_points;
use crate::{Error, engine::RouteEngine, model::RailNetwork, model::StationPoints};

/// Creates a rail network based on the provided configuration
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the network file
/// cannot be read
pub fn create_rail_network(config: &NetworkConfig) -> Result<RailNetwork, Error> {
    config.validate()?;

    let (nodes, edges) = load_graphml(&config.graph_path)?;
    info!("Projecting rail network onto the National Grid");
    let network = RailNetwork::from_parts(nodes, edges, config.weights())?;
    info!(
        "Rail network created: {} nodes, {} edges",
        network.node_count(),
        network.edge_count()
    );

    // Parsing the XML document allocates far more than the finished network
    // keeps. This call will release all free memory from the tail of the heap
    // back to the system.
    //
    // # Safety
    //
    // This call is safe to use on linux with glibc implementation
    // which is checked by the cfg attribute in compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::warn!("Memory trimming failed - continuing anyway");
        } else {
            log::debug!("Successfully trimmed unused heap memory");
        }
    }
    Ok(network)
}

/// Creates a route engine over the configured network and stations. Without
/// a stations file the engine knows no stations.
///
/// # Errors
///
/// Returns an error if the network or the stations cannot be loaded
pub fn create_route_engine(config: &NetworkConfig) -> Result<RouteEngine<StationPoints>, Error> {
    let network = create_rail_network(config)?;
    let stations = match &config.stations_path {
        Some(path) => load_station_points(path)?,
        None => StationPoints::new(),
    };
    Ok(RouteEngine::new(
        network,
        stations,
        config.insertion_options(),
        config.search_options(),
    ))
}
