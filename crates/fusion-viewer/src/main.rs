//! Entry point for the fused point-cloud viewer.

use anyhow::Result;
use clap::Parser;
use fusion_viewer::{
    config::Cli,
    data::FusedPointCloud,
    driver::{spawn_capture, DriverConfig},
    source::{synthetic::SyntheticConfig, MappingService, SyntheticMapper},
    Viewer,
};
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let cli = Cli::parse();

    let mapper = SyntheticMapper::new(SyntheticConfig {
        model: cli.device_model,
        chunk_points: cli.chunk_points,
        chunks_per_refresh: cli.chunks_per_refresh,
        frame_period: Duration::from_millis(cli.frame_period_ms),
        ..SyntheticConfig::default()
    });

    // The map is written by the capture thread and read by the renderer.
    let map = Arc::new(RwLock::new(FusedPointCloud::default()));

    let mut viewer = Viewer::init(
        cli.viewer_settings(),
        mapper.intrinsics(),
        map.clone(),
        mapper.model(),
    )?;

    let capture = spawn_capture(
        mapper,
        viewer.handle(),
        map,
        DriverConfig {
            map_request_interval: Duration::from_millis(cli.map_request_interval_ms),
        },
    )?;

    while viewer.is_available() {}

    viewer.exit();
    match capture.join() {
        Ok(result) => {
            result?;
        }
        Err(_) => log::error!("Capture thread panicked"),
    }

    Ok(())
}
