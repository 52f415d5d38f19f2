// src/data/mod.rs
//! Data handling modules for the fused point-cloud viewer.
//!
//! This module provides functionality for:
//! - The pose, tracking and point-cloud types exchanged with the mapping service.
//! - Mirroring the chunked map on the GPU.
//! - The trail and housing renderables.

pub mod map;
pub mod model;
pub mod object;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::types::{
    CameraIntrinsics, DeviceModel, FusedPointCloud, PointCloudChunk, PointVertex, Pose,
    TrackingState,
};
