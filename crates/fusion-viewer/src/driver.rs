//! The capture loop: feeds poses and map refreshes from a mapping service
//! into the viewer until the viewer stops.

use crate::{
    data::types::{FusedPointCloud, TrackingState},
    source::MappingService,
    viewer::ViewerHandle,
};
use anyhow::Context;
use parking_lot::RwLock;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Minimum time between two map refresh requests.
    pub map_request_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            map_request_interval: Duration::from_millis(30),
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub frames: u64,
    pub requests: u64,
    pub retrievals: u64,
}

/// Runs the capture loop on the calling thread.
///
/// A refresh is only requested while tracking is OK, once the previous batch
/// reached the GPU and at least `map_request_interval` after the last request.
pub fn run_capture<M: MappingService>(
    mapper: &mut M,
    viewer: &ViewerHandle,
    map: &RwLock<FusedPointCloud>,
    config: &DriverConfig,
) -> anyhow::Result<DriverStats> {
    let mut stats = DriverStats::default();
    let mut last_request: Option<Instant> = None;

    while viewer.is_running() {
        mapper.grab().context("failed to grab a frame")?;
        stats.frames += 1;

        let (pose, tracking) = mapper.pose();
        viewer.update_pose(pose, tracking);

        if tracking != TrackingState::Ok {
            continue;
        }

        let due = last_request.map_or(true, |t| t.elapsed() > config.map_request_interval);
        if due && viewer.chunks_updated() {
            mapper.request_map();
            last_request = Some(Instant::now());
            stats.requests += 1;
        }

        if mapper.map_ready() {
            mapper.retrieve_map(&mut map.write());
            viewer.update_chunks();
            stats.retrievals += 1;
        }
    }

    log::info!(
        "Capture stopped after {} frames ({} map requests, {} retrievals)",
        stats.frames,
        stats.requests,
        stats.retrievals
    );
    Ok(stats)
}

/// Runs [`run_capture`] on a dedicated thread. The viewer is asked to exit
/// if the loop fails.
pub fn spawn_capture<M>(
    mut mapper: M,
    viewer: ViewerHandle,
    map: Arc<RwLock<FusedPointCloud>>,
    config: DriverConfig,
) -> std::io::Result<thread::JoinHandle<anyhow::Result<DriverStats>>>
where
    M: MappingService + 'static,
{
    thread::Builder::new()
        .name("capture".into())
        .spawn(move || {
            let result = run_capture(&mut mapper, &viewer, &map, &config);
            if let Err(e) = &result {
                log::error!("Capture thread error: {:#}", e);
                viewer.exit();
            }
            result
        })
}
