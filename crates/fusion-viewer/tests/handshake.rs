//! Capture thread and render tick running concurrently against one mailbox.

use fusion_viewer::{
    app::ViewerScene,
    config::ViewerSettings,
    data::{DeviceModel, FusedPointCloud},
    driver::{spawn_capture, DriverConfig},
    input::InputState,
    renderer::upload::Uploader,
    source::{synthetic::SyntheticConfig, SyntheticMapper},
    state::{ChunkHandshake, SharedState},
    ViewerHandle,
};
use parking_lot::RwLock;
use std::{
    cell::Cell,
    sync::Arc,
    time::{Duration, Instant},
};

/// Counts bytes instead of talking to a GPU. Buffers are just their size.
#[derive(Default)]
struct CountingUploader {
    written: Cell<u64>,
}

impl Uploader for CountingUploader {
    type Buffer = u64;

    fn create_buffer(&self, _label: &str, _usage: wgpu::BufferUsages, size: u64) -> u64 {
        size
    }

    fn write_buffer(&self, buffer: &u64, contents: &[u8]) {
        assert!(contents.len() as u64 <= *buffer);
        self.written.set(self.written.get() + contents.len() as u64);
    }

    fn buffer_size(buffer: &u64) -> u64 {
        *buffer
    }
}

#[test]
fn renderer_mirrors_the_map_built_by_the_capture_thread() {
    let shared = Arc::new(SharedState::new());
    let handle = ViewerHandle::new(shared.clone());
    let map = Arc::new(RwLock::new(FusedPointCloud::default()));

    let mapper = SyntheticMapper::new(SyntheticConfig {
        chunk_points: 32,
        frame_period: Duration::ZERO,
        ..SyntheticConfig::default()
    });
    let capture = spawn_capture(
        mapper,
        handle.clone(),
        map.clone(),
        DriverConfig {
            map_request_interval: Duration::ZERO,
        },
    )
    .expect("spawn capture thread");

    let uploader = CountingUploader::default();
    let mut scene = ViewerScene::<u64>::new(ViewerSettings::default(), DeviceModel::ZedMini);
    let input = InputState::new();

    let deadline = Instant::now() + Duration::from_secs(20);
    let mut syncs = 0;
    while syncs < 10 && Instant::now() < deadline {
        let requested = shared.handshake() == ChunkHandshake::Requested;
        scene.tick(&uploader, &input, &shared, &map);
        if requested {
            syncs += 1;
            // A sync always completes within the tick that took it.
            assert_ne!(shared.handshake(), ChunkHandshake::Syncing);
        }
        std::thread::yield_now();
    }
    assert_eq!(syncs, 10, "capture thread stalled");

    handle.exit();
    let stats = capture
        .join()
        .expect("capture thread panicked")
        .expect("capture loop failed");

    // Drain whatever the producer staged after the last tick.
    scene.tick(&uploader, &input, &shared, &map);
    assert!(shared.chunks_updated());

    let cloud = map.read();
    assert!(stats.retrievals >= 10);
    assert_eq!(scene.map.point_count(), cloud.total_points() as u64);
    assert!(scene.map.slot_count() >= cloud.chunks.len());
    assert_eq!(scene.map.slot_count() % 500, 0);
    assert_eq!(scene.trail.vertices().len() as u64, stats.frames);
    assert!(uploader.written.get() > 0);
}
