//! Binary entry point that glues the remote catalog to the TUI: read settings,
//! install the logger, build the gateway, and drive the Ratatui event loop
//! until the user exits.
use std::sync::Arc;

use anyhow::{anyhow, Context};
use log::info;

use track_catalog::{logging, run_app, App, CatalogEngine, Dispatcher, HttpGateway, Settings};

/// Returning a `Result` surfaces configuration problems on the terminal
/// instead of starting a UI that cannot reach anything.
fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to read configuration")?;
    settings
        .validate()
        .map_err(|message| anyhow!(message))
        .context("invalid configuration")?;

    logging::init(&settings.log.level);
    info!("using catalog at {}", settings.api.base_url);

    let gateway = Arc::new(HttpGateway::new(
        &settings.api.base_url,
        settings.api.connect_timeout(),
        settings.api.read_timeout(),
    ));
    let dispatcher = Dispatcher::new(gateway);
    let engine = CatalogEngine::new(settings.api.list_limit, settings.view.initial_query());

    let mut app = App::new(engine, dispatcher);
    run_app(&mut app)
}
