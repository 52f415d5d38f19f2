//! Producers of poses and fused maps consumed by the capture driver.

pub mod synthetic;

use crate::data::types::{CameraIntrinsics, DeviceModel, FusedPointCloud, Pose, TrackingState};

pub use self::synthetic::SyntheticMapper;

/// A tracked depth sensor that fuses its frames into a chunked point cloud.
///
/// Map refreshes are asynchronous: [`request_map`](Self::request_map) starts
/// one, [`map_ready`](Self::map_ready) polls it and
/// [`retrieve_map`](Self::retrieve_map) copies the result, flagging the
/// chunks that changed since the previous retrieval.
pub trait MappingService: Send {
    fn model(&self) -> DeviceModel;

    fn intrinsics(&self) -> CameraIntrinsics;

    /// Captures and processes the next frame.
    fn grab(&mut self) -> anyhow::Result<()>;

    /// Pose of the last grabbed frame.
    fn pose(&self) -> (Pose, TrackingState);

    fn request_map(&mut self);

    fn map_ready(&self) -> bool;

    fn retrieve_map(&mut self, map: &mut FusedPointCloud);
}
