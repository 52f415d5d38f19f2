//! Core data types shared by the capture side and the renderer.

use glam::{Mat4, Quat, Vec3};
use std::fmt;

/// A point of the fused map as delivered by the mapping service.
/// Must match the vertex layout of the map point pipeline.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, Default, PartialEq)]
pub struct PointVertex {
    /// Position in world space (millimetres).
    pub position: [f32; 3],
    /// Colour packed as `0x00RRGGBB`.
    pub packed_color: u32,
}

impl PointVertex {
    pub fn new(position: Vec3, rgb: [u8; 3]) -> Self {
        Self {
            position: position.to_array(),
            packed_color: pack_rgb(rgb),
        }
    }
}

/// Packs an 8-bit RGB triple into the layout read by the point shader.
#[inline]
pub fn pack_rgb([r, g, b]: [u8; 3]) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// A coloured vertex of the trail and of the housing mesh.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, Default, PartialEq)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Per-draw uniform block, std140.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    /// Model-view-projection matrix in wgpu clip conventions.
    pub mvp: [[f32; 4]; 4],
}

impl DrawUniform {
    pub fn new(mvp: Mat4) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
        }
    }
}

/// Quality of the positional tracking reported alongside each pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    Ok,
    /// Tracking is degraded and the service is relocalising.
    Searching,
    #[default]
    Off,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingState::Ok => "OK",
            TrackingState::Searching => "SEARCHING",
            TrackingState::Off => "OFF",
        };
        f.write_str(s)
    }
}

/// A timestamped rigid transform of the sensor in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub timestamp_ns: u64,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(timestamp_ns: u64, translation: Vec3, rotation: Quat) -> Self {
        Self {
            timestamp_ns,
            translation,
            rotation,
        }
    }

    /// Sensor-to-world transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0, Vec3::ZERO, Quat::IDENTITY)
    }
}

/// One independently refreshed region of the fused map.
#[derive(Debug, Clone, Default)]
pub struct PointCloudChunk {
    pub vertices: Vec<PointVertex>,
    /// Set by the mapping service when the chunk changed since the last retrieval.
    pub has_been_updated: bool,
}

/// The chunked point cloud maintained by the mapping service.
#[derive(Debug, Clone, Default)]
pub struct FusedPointCloud {
    pub chunks: Vec<PointCloudChunk>,
}

impl FusedPointCloud {
    pub fn total_points(&self) -> usize {
        self.chunks.iter().map(|c| c.vertices.len()).sum()
    }
}

/// Which sensor housing to draw at the tracked pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeviceModel {
    #[default]
    Zed,
    Zed2,
    ZedMini,
}

/// Left-camera intrinsics of the sensor, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
}

impl CameraIntrinsics {
    /// Horizontal and vertical field of view in degrees.
    pub fn fov_deg(&self) -> (f32, f32) {
        let h = 2.0 * (self.width as f32 / (2.0 * self.fx)).atan();
        let v = 2.0 * (self.height as f32 / (2.0 * self.fy)).atan();
        (h.to_degrees(), v.to_degrees())
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        // HD720 left camera of a ZED.
        Self {
            fx: 700.0,
            fy: 700.0,
            cx: 640.0,
            cy: 360.0,
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_rgb_into_low_three_bytes() {
        assert_eq!(pack_rgb([0x12, 0x34, 0x56]), 0x0012_3456);
        assert_eq!(PointVertex::new(Vec3::ONE, [255, 0, 0]).packed_color, 0x00FF_0000);
    }

    #[test]
    fn point_vertex_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<PointVertex>(), 16);
        assert_eq!(std::mem::size_of::<ColorVertex>(), 24);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 64);
    }

    #[test]
    fn intrinsics_fov_is_symmetric_for_centered_sensor() {
        let k = CameraIntrinsics {
            fx: 500.0,
            fy: 500.0,
            cx: 500.0,
            cy: 500.0,
            width: 1000,
            height: 1000,
        };
        let (h, v) = k.fov_deg();
        assert!((h - 90.0).abs() < 1e-3);
        assert!((v - 90.0).abs() < 1e-3);
    }
}
