//! State shared between the capture thread and the render thread.
//!
//! The capture thread (producer) stages poses, trail points and the "new
//! chunks" signal; the render thread (consumer) takes them once per frame.
//! Everything staged lives behind one mutex. The critical section on either
//! side only moves data in or out of [`Staged`]: no GPU call and no mapping
//! service call is ever made while it is held.

use crate::data::types::{Pose, TrackingState};
use glam::Vec3;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hand-off of map refreshes between the driver and the renderer.
///
/// `Idle → Requested → Syncing → Idle`. The driver may only ask the mapping
/// service for another batch while the state is `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkHandshake {
    /// The last batch is on the GPU ("chunks pushed").
    Idle,
    /// A new batch was retrieved and waits for the renderer ("new chunks").
    Requested,
    /// The renderer took the batch and is uploading it.
    Syncing,
}

#[derive(Debug)]
struct Staged {
    pose: Pose,
    tracking: TrackingState,
    pending_points: Vec<Vec3>,
    position_dirty: bool,
    chunks: ChunkHandshake,
}

/// What the render thread takes out of the mailbox at the top of a frame.
#[derive(Debug, Clone)]
pub struct FrameUpdate {
    /// Latest pose, whether or not it changed this frame.
    pub pose: Pose,
    pub tracking: TrackingState,
    /// True if at least one pose arrived since the previous frame.
    pub pose_changed: bool,
    /// Trail points staged since the previous frame, oldest first.
    pub new_points: Vec<Vec3>,
    /// The renderer must sync the map and then call
    /// [`SharedState::finish_chunk_sync`].
    pub sync_chunks: bool,
}

/// The mailbox between producer and consumer.
#[derive(Debug)]
pub struct SharedState {
    staged: Mutex<Staged>,
    running: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            staged: Mutex::new(Staged {
                pose: Pose::default(),
                tracking: TrackingState::Off,
                pending_points: Vec::new(),
                position_dirty: false,
                chunks: ChunkHandshake::Idle,
            }),
            running: AtomicBool::new(true),
        }
    }

    /// Producer: stages a new pose and its trail point.
    pub fn on_pose_update(&self, pose: Pose, tracking: TrackingState) {
        let mut staged = self.staged.lock();
        staged.pending_points.push(pose.translation);
        staged.pose = pose;
        staged.tracking = tracking;
        staged.position_dirty = true;
    }

    /// Producer: signals that the shared point cloud holds a new batch.
    pub fn on_chunks_available(&self) {
        let mut staged = self.staged.lock();
        if staged.chunks != ChunkHandshake::Idle {
            // Overlapping requests are the driver's bug; the flag stays lowered.
            log::debug!("Chunk batch signalled while {:?}", staged.chunks);
        }
        staged.chunks = ChunkHandshake::Requested;
    }

    /// Producer: true once the previous batch reached the GPU.
    pub fn chunks_updated(&self) -> bool {
        self.staged.lock().chunks == ChunkHandshake::Idle
    }

    pub fn handshake(&self) -> ChunkHandshake {
        self.staged.lock().chunks
    }

    /// Consumer: takes everything staged since the previous frame.
    pub fn begin_frame(&self) -> FrameUpdate {
        let mut staged = self.staged.lock();

        let sync_chunks = staged.chunks == ChunkHandshake::Requested;
        if sync_chunks {
            staged.chunks = ChunkHandshake::Syncing;
        }
        let pose_changed = std::mem::replace(&mut staged.position_dirty, false);

        FrameUpdate {
            pose: staged.pose,
            tracking: staged.tracking,
            pose_changed,
            new_points: std::mem::take(&mut staged.pending_points),
            sync_chunks,
        }
    }

    /// Consumer: the batch taken by [`begin_frame`](Self::begin_frame) is uploaded.
    ///
    /// A batch signalled during the upload stays requested for the next frame.
    pub fn finish_chunk_sync(&self) {
        let mut staged = self.staged.lock();
        if staged.chunks == ChunkHandshake::Syncing {
            staged.chunks = ChunkHandshake::Idle;
        }
    }

    /// Asks the render loop to stop after the current frame.
    pub fn request_exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn pose_at(y: f32) -> Pose {
        Pose::new((y * 1000.0) as u64, Vec3::new(0.0, y, 0.0), Quat::IDENTITY)
    }

    #[test]
    fn starts_idle_and_pushed() {
        let s = SharedState::new();
        assert!(s.chunks_updated());
        assert_eq!(s.handshake(), ChunkHandshake::Idle);
        assert!(s.is_running());
    }

    #[test]
    fn handshake_goes_requested_syncing_idle() {
        let s = SharedState::new();
        s.on_chunks_available();
        assert!(!s.chunks_updated());
        assert_eq!(s.handshake(), ChunkHandshake::Requested);

        let frame = s.begin_frame();
        assert!(frame.sync_chunks);
        assert_eq!(s.handshake(), ChunkHandshake::Syncing);
        // Mid-sync the producer still sees the batch as not pushed.
        assert!(!s.chunks_updated());

        s.finish_chunk_sync();
        assert!(s.chunks_updated());

        // Nothing new next frame.
        assert!(!s.begin_frame().sync_chunks);
    }

    #[test]
    fn second_request_before_sync_keeps_flag_lowered() {
        let s = SharedState::new();
        s.on_chunks_available();
        s.on_chunks_available();
        assert!(!s.chunks_updated());
        assert_eq!(s.handshake(), ChunkHandshake::Requested);

        // Both signals collapse into one sync.
        assert!(s.begin_frame().sync_chunks);
        s.finish_chunk_sync();
        assert!(s.chunks_updated());
    }

    #[test]
    fn request_during_sync_survives_the_sync() {
        let s = SharedState::new();
        s.on_chunks_available();
        assert!(s.begin_frame().sync_chunks);
        s.on_chunks_available();
        s.finish_chunk_sync();

        assert!(!s.chunks_updated());
        assert!(s.begin_frame().sync_chunks);
        s.finish_chunk_sync();
        assert!(s.chunks_updated());
    }

    #[test]
    fn poses_are_drained_in_order() {
        let s = SharedState::new();
        for y in [1.0, 2.0, 3.0] {
            s.on_pose_update(pose_at(y), TrackingState::Ok);
        }

        let frame = s.begin_frame();
        assert!(frame.pose_changed);
        assert_eq!(frame.tracking, TrackingState::Ok);
        assert_eq!(frame.pose.translation, Vec3::new(0.0, 3.0, 0.0));
        let ys: Vec<f32> = frame.new_points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![1.0, 2.0, 3.0]);

        let next = s.begin_frame();
        assert!(!next.pose_changed);
        assert!(next.new_points.is_empty());
        // The latest pose is still reported.
        assert_eq!(next.pose.translation.y, 3.0);
    }

    #[test]
    fn exit_is_observed() {
        let s = SharedState::new();
        s.request_exit();
        assert!(!s.is_running());
    }
}
