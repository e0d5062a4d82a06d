use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trip_router::config::{ConfigError, ParkingZonesConfig, RouterConfig, VehicleFeedConfig};
use trip_router::graph::{Graph, GraphError, NetworkDescription};
use trip_router::linking::StreetSplitter;
use trip_router::updater::{
    HttpParkingZoneFeed, HttpVehicleFeed, ParkingZonesUpdater, SharedVehicleUpdater,
    UpdaterError, UpdaterManager,
};
use trip_router::writer::GraphWriter;

/// Environment variable naming the JSON config file.
const CONFIG_VAR: &str = "TRIP_ROUTER_CONFIG";

/// Errors that stop the router from starting.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn load_config() -> Result<RouterConfig, StartupError> {
    match std::env::var(CONFIG_VAR) {
        Ok(path) => Ok(RouterConfig::load(&path)?),
        Err(_) => {
            warn!("{CONFIG_VAR} not set, using default configuration");
            Ok(RouterConfig::default())
        }
    }
}

fn load_graph(config: &RouterConfig) -> Result<Graph, StartupError> {
    let Some(path) = &config.network_path else {
        warn!("no network configured, starting with an empty graph");
        return Ok(Graph::new());
    };
    Ok(NetworkDescription::load(path)?.build()?)
}

fn vehicle_updater(
    graph: &Arc<Graph>,
    config: &VehicleFeedConfig,
) -> Result<SharedVehicleUpdater<HttpVehicleFeed>, UpdaterError> {
    let feed = HttpVehicleFeed::from_config(config)?;
    Ok(SharedVehicleUpdater::new(graph.clone(), feed, config.poll_period()?))
}

fn parking_zones_updater(
    graph: &Arc<Graph>,
    config: &ParkingZonesConfig,
) -> Result<ParkingZonesUpdater<HttpParkingZoneFeed>, UpdaterError> {
    let feed = HttpParkingZoneFeed::from_config(config)?;
    Ok(ParkingZonesUpdater::new(graph.clone(), feed, config.poll_period()?))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let graph = match load_graph(&config) {
        Ok(graph) => Arc::new(graph),
        Err(e) => {
            error!(error = %e, "failed to load network");
            return ExitCode::FAILURE;
        }
    };

    let report = StreetSplitter::new(&graph, config.linker.clone()).link_all();
    info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        linked = report.linked,
        unlinked = report.unlinked,
        "graph ready"
    );

    let writer = match GraphWriter::spawn(graph.clone()) {
        Ok(writer) => writer,
        Err(e) => {
            error!(error = %e, "failed to start graph writer");
            return ExitCode::FAILURE;
        }
    };
    let mut manager = UpdaterManager::new(writer);

    if let Some(vehicles) = &config.vehicles
        && let Err(e) = vehicle_updater(&graph, vehicles).and_then(|u| manager.spawn(u))
    {
        error!(error = %e, "vehicle updates disabled");
    }
    if let Some(zones) = &config.parking_zones
        && let Err(e) = parking_zones_updater(&graph, zones).and_then(|u| manager.spawn(u))
    {
        error!(error = %e, "parking zone updates disabled");
    }

    info!(updaters = manager.len(), "trip router running, press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
    }

    manager.shutdown().await;
    ExitCode::SUCCESS
}
