//! Headless FetchReel host: applies backend notifications read from stdin to
//! the reconciliation state and executes the resulting effects.
mod config;
mod dispatcher;
mod effects;
mod inbound;

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::Context;
use reel_core::{AppState, Msg};
use reel_engine::{EngineHandle, HlsDurationProbe, HttpBackend};
use reel_logging::{reel_info, reel_warn};

use crate::config::ConfigError;
use crate::dispatcher::Dispatcher;
use crate::effects::EffectRunner;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::CONFIG_FILE_NAME));
    let (config, problem) = config::read_or_default(&config_path);

    if let Err(err) = reel_logging::initialize(
        config.log_destination.into(),
        config.log_level(),
        &config.log_file,
    ) {
        reel_warn!("{}; logging to the terminal only", err);
    }
    match problem {
        None => reel_info!("loaded configuration from {:?}", config_path),
        Some(ConfigError::Missing(path)) => {
            reel_info!("no configuration at {:?}; using defaults", path)
        }
        Some(err) => reel_warn!("{}; using defaults", err),
    }

    let backend = HttpBackend::new(config.backend_settings())
        .with_context(|| format!("invalid backend url {:?}", config.backend_url))?;
    let probe = HlsDurationProbe::new(config.connect_timeout(), config.request_timeout())
        .context("failed to set up the playlist probe")?;
    reel_info!(
        "backend {} proxy {}",
        backend.base_url(),
        config.proxy_base
    );

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let engine = EngineHandle::new(Arc::new(backend), Arc::new(probe), msg_tx.clone());
    inbound::spawn_reader(BufReader::new(io::stdin()), msg_tx.clone());
    msg_tx
        .send(Msg::Bootstrap)
        .context("dispatcher channel closed before start")?;
    drop(msg_tx);

    let dispatcher = Dispatcher::new(
        AppState::with_proxy_base(config.proxy_base.clone()),
        EffectRunner::new(engine),
    );
    dispatcher.run(msg_rx).shutdown();
    reel_info!("fetch_reel stopped");
    Ok(())
}
