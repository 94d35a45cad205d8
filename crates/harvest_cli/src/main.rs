mod cli;
mod config;
mod control;
mod render;

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use harvest_core::SessionState;
use harvest_engine::{EngineConfig, EngineHandle};
use harvest_logging::{harvest_error, harvest_info};

use crate::cli::{Cli, Command};
use crate::config::{load_file_config, page_source, Settings};
use crate::control::{spawn_input_reader, ControlSurface};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_file_config(cli.config.as_deref())?;
    let settings = Settings::resolve(loaded.config, &cli)?;

    if !harvest_logging::initialize(settings.log_level, settings.log_destination.clone()) {
        eprintln!("warning: file logging could not be set up");
    }
    harvest_info!("contact-harvest {} starting", env!("CARGO_PKG_VERSION"));
    match &loaded.source {
        Some(path) => harvest_info!("Loaded config from {:?}", path),
        None => harvest_info!("No config file; using defaults"),
    }

    let engine = EngineHandle::new(EngineConfig {
        api: settings.api,
        harvest: settings.harvest,
        page: page_source(&cli)?,
        clock: Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    })
    .context("could not start the harvest engine")?;

    let mut surface = ControlSurface::new(engine, settings.output_dir, io::stdout());
    match cli.command {
        Command::Count => {
            let view = surface.count()?;
            if view.count.is_none() {
                bail!("could not count connections");
            }
        }
        Command::Harvest { format, .. } => {
            eprintln!("Type `c` and press Enter to cancel.");
            let input = spawn_input_reader();
            let view = surface.harvest(format.into(), &input)?;
            match view.session {
                SessionState::Failed => {
                    harvest_error!("Harvest failed");
                    bail!("harvest failed");
                }
                SessionState::Completed if view.saved_to.is_none() => {
                    bail!("harvest completed but the export was not written");
                }
                _ => {}
            }
        }
    }
    Ok(())
}
