//! A deterministic stand-in for a live sensor.
//!
//! The sensor climbs a slow helix while looking along its path. Every map
//! refresh discovers a few new chunks around the current position and
//! densifies the most recent ones, so both growth and partial updates are
//! exercised.

use crate::data::types::{
    CameraIntrinsics, DeviceModel, FusedPointCloud, PointCloudChunk, PointVertex, Pose,
    TrackingState,
};
use crate::source::MappingService;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Duration;

const HELIX_RADIUS_MM: f32 = 2000.0;
const HELIX_RISE_MM_PER_RAD: f32 = 80.0;
const RAD_PER_FRAME: f32 = 0.004;
/// Frames spent relocalising before tracking reports OK.
const SEARCHING_FRAMES: u64 = 20;
/// Frames a map request takes to complete.
const MAP_LATENCY_FRAMES: u64 = 2;
/// Extra points added to a chunk each time it is refined.
const REFINE_POINTS: usize = 512;
/// Number of most recent chunks refined on each refresh.
const REFINED_CHUNKS: usize = 2;
const CHUNK_EXTENT_MM: f32 = 600.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub model: DeviceModel,
    pub chunk_points: usize,
    pub chunks_per_refresh: usize,
    /// Wall-clock time of one grab. Zero runs as fast as possible.
    pub frame_period: Duration,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            model: DeviceModel::Zed,
            chunk_points: 4096,
            chunks_per_refresh: 3,
            frame_period: Duration::from_millis(15),
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone)]
struct Chunk {
    center: Vec3,
    points: Vec<PointVertex>,
    refinements: u32,
    dirty: bool,
}

pub struct SyntheticMapper {
    config: SyntheticConfig,
    frame: u64,
    pose: Pose,
    tracking: TrackingState,
    chunks: Vec<Chunk>,
    /// Frame at which the pending request completes.
    pending: Option<u64>,
}

impl SyntheticMapper {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame: 0,
            pose: Pose::default(),
            tracking: TrackingState::Off,
            chunks: Vec::new(),
            pending: None,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sensor pose after `frame` grabs.
    pub fn pose_at(frame: u64) -> Pose {
        let angle = frame as f32 * RAD_PER_FRAME;
        let translation = Vec3::new(
            HELIX_RADIUS_MM * angle.cos() - HELIX_RADIUS_MM,
            HELIX_RISE_MM_PER_RAD * angle,
            HELIX_RADIUS_MM * angle.sin(),
        );
        // Look along the tangent (-sin, 0, cos): rotating -Z by pi - angle about Y.
        let rotation = Quat::from_rotation_y(std::f32::consts::PI - angle);
        Pose::new(frame * 16_666_667, translation, rotation)
    }

    fn discover(&mut self) {
        let forward = self.pose.rotation * Vec3::NEG_Z;
        let right = self.pose.rotation * Vec3::X;
        let base = self.chunks.len();
        let n = self.config.chunks_per_refresh;

        let centers: Vec<Vec3> = (0..n)
            .map(|i| {
                let side = i as f32 - (n as f32 - 1.0) * 0.5;
                self.pose.translation
                    + forward * 1500.0
                    + right * side * CHUNK_EXTENT_MM * 1.5
            })
            .collect();

        let seed = self.config.seed;
        let count = self.config.chunk_points;
        let fresh: Vec<Chunk> = centers
            .into_par_iter()
            .enumerate()
            .map(|(i, center)| Chunk {
                points: scatter(seed, (base + i) as u64, 0, center, count),
                center,
                refinements: 0,
                dirty: true,
            })
            .collect();

        self.chunks.extend(fresh);
    }

    fn refine(&mut self) {
        let seed = self.config.seed;
        let start = self.chunks.len().saturating_sub(REFINED_CHUNKS + self.config.chunks_per_refresh);
        let end = self.chunks.len().saturating_sub(self.config.chunks_per_refresh);

        self.chunks[start..end]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, chunk)| {
                chunk.refinements += 1;
                let extra = scatter(
                    seed,
                    (start + i) as u64,
                    chunk.refinements,
                    chunk.center,
                    REFINE_POINTS,
                );
                chunk.points.extend(extra);
                chunk.dirty = true;
            });
    }
}

/// Points of one chunk: a noisy patch of floor plus a wall behind it,
/// coloured by height.
fn scatter(seed: u64, chunk: u64, pass: u32, center: Vec3, count: usize) -> Vec<PointVertex> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ (chunk << 16) ^ pass as u64);
    let half = CHUNK_EXTENT_MM * 0.5;

    (0..count)
        .map(|_| {
            let x = rng.gen_range(-half..half);
            let z = rng.gen_range(-half..half);
            let on_wall = rng.gen_bool(0.3);
            let p = if on_wall {
                Vec3::new(x, rng.gen_range(0.0..CHUNK_EXTENT_MM), -half)
            } else {
                Vec3::new(x, -800.0 + rng.gen_range(-5.0..5.0), z)
            };

            let shade = ((p.y + 800.0) / (CHUNK_EXTENT_MM + 800.0)).clamp(0.0, 1.0);
            let rgb = [
                (90.0 + 120.0 * shade) as u8,
                (110.0 + 80.0 * shade) as u8,
                (140.0 - 60.0 * shade) as u8,
            ];
            PointVertex::new(center + p, rgb)
        })
        .collect()
}

impl MappingService for SyntheticMapper {
    fn model(&self) -> DeviceModel {
        self.config.model
    }

    fn intrinsics(&self) -> CameraIntrinsics {
        CameraIntrinsics::default()
    }

    fn grab(&mut self) -> anyhow::Result<()> {
        if !self.config.frame_period.is_zero() {
            std::thread::sleep(self.config.frame_period);
        }

        self.frame += 1;
        self.pose = Self::pose_at(self.frame);
        self.tracking = if self.frame <= SEARCHING_FRAMES {
            TrackingState::Searching
        } else {
            TrackingState::Ok
        };
        Ok(())
    }

    fn pose(&self) -> (Pose, TrackingState) {
        (self.pose, self.tracking)
    }

    fn request_map(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.frame + MAP_LATENCY_FRAMES);
        }
    }

    fn map_ready(&self) -> bool {
        self.pending.is_some_and(|at| self.frame >= at)
    }

    fn retrieve_map(&mut self, map: &mut FusedPointCloud) {
        if !self.map_ready() {
            return;
        }
        self.pending = None;

        self.discover();
        self.refine();

        map.chunks.resize_with(self.chunks.len(), PointCloudChunk::default);
        for (out, chunk) in map.chunks.iter_mut().zip(&mut self.chunks) {
            out.has_been_updated = std::mem::take(&mut chunk.dirty);
            if out.has_been_updated {
                out.vertices.clone_from(&chunk.points);
            }
        }

        log::debug!(
            "Synthetic map: {} chunks, {} points",
            map.chunks.len(),
            map.total_points()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> SyntheticMapper {
        SyntheticMapper::new(SyntheticConfig {
            chunk_points: 64,
            frame_period: Duration::ZERO,
            ..SyntheticConfig::default()
        })
    }

    fn grab_n(m: &mut SyntheticMapper, n: usize) {
        for _ in 0..n {
            m.grab().unwrap();
        }
    }

    #[test]
    fn tracking_settles_after_searching() {
        let mut m = mapper();
        assert_eq!(m.pose().1, TrackingState::Off);
        grab_n(&mut m, 1);
        assert_eq!(m.pose().1, TrackingState::Searching);
        grab_n(&mut m, SEARCHING_FRAMES as usize);
        assert_eq!(m.pose().1, TrackingState::Ok);
    }

    #[test]
    fn sensor_looks_along_its_path() {
        for frame in [1, 100, 700] {
            let a = SyntheticMapper::pose_at(frame);
            let b = SyntheticMapper::pose_at(frame + 1);
            let travel = (b.translation - a.translation) * Vec3::new(1.0, 0.0, 1.0);
            let look = a.rotation * Vec3::NEG_Z;
            assert!(travel.normalize().dot(look) > 0.99);
        }
    }

    #[test]
    fn map_is_ready_after_latency() {
        let mut m = mapper();
        let mut map = FusedPointCloud::default();

        m.request_map();
        assert!(!m.map_ready());
        m.retrieve_map(&mut map);
        assert!(map.chunks.is_empty());

        grab_n(&mut m, MAP_LATENCY_FRAMES as usize);
        assert!(m.map_ready());
        m.retrieve_map(&mut map);
        assert_eq!(map.chunks.len(), 3);
        assert!(map.chunks.iter().all(|c| c.has_been_updated && c.vertices.len() == 64));
        assert!(!m.map_ready());
    }

    #[test]
    fn refresh_grows_and_refines_only_recent_chunks() {
        let mut m = mapper();
        let mut map = FusedPointCloud::default();
        for _ in 0..3 {
            m.request_map();
            grab_n(&mut m, MAP_LATENCY_FRAMES as usize);
            m.retrieve_map(&mut map);
        }

        assert_eq!(map.chunks.len(), 9);
        let updated: Vec<bool> = map.chunks.iter().map(|c| c.has_been_updated).collect();
        // The oldest chunks are untouched; the two before the new batch were refined.
        assert_eq!(
            updated,
            vec![false, false, false, false, true, true, true, true, true]
        );
        assert_eq!(map.chunks[5].vertices.len(), 64 + REFINE_POINTS);
        assert_eq!(map.chunks[0].vertices.len(), 64);
    }

    #[test]
    fn generation_is_deterministic() {
        let c = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(scatter(7, 3, 0, c, 32), scatter(7, 3, 0, c, 32));
        assert_ne!(scatter(7, 3, 0, c, 32), scatter(7, 3, 1, c, 32));
    }
}
