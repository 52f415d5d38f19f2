//! Renderable mirror of the fused point cloud.
//!
//! The mapping service reports its map as an ever-growing list of chunks, each
//! with an "updated since last retrieval" flag. [`ChunkedMap`] keeps one GPU
//! mesh per chunk and only re-uploads the chunks that changed.

use crate::data::types::{FusedPointCloud, PointCloudChunk};
use crate::renderer::upload::{GpuMesh, Uploader};

/// Chunk slots are allocated in batches of this many.
pub const DEFAULT_CHUNK_BATCH: usize = 500;

/// The GPU-side copy of the fused map.
///
/// The slot count only ever grows during a session. Slots past the external
/// chunk count are never synced and stay empty.
pub struct ChunkedMap<B = wgpu::Buffer> {
    slots: Vec<GpuMesh<B>>,
    batch: usize,
}

impl<B> ChunkedMap<B> {
    pub fn new(batch: usize) -> Self {
        Self {
            slots: Vec::new(),
            batch: batch.max(1),
        }
    }

    /// Number of allocated chunk slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Total number of points currently uploaded.
    pub fn point_count(&self) -> u64 {
        self.slots.iter().map(|s| s.count() as u64).sum()
    }

    /// Points drawn by the slot at `index`, if that slot exists.
    pub fn chunk_len(&self, index: usize) -> Option<u32> {
        self.slots.get(index).map(GpuMesh::count)
    }

    /// Grows the slot array to the next batch multiple above `chunk_count`.
    pub fn reserve_for(&mut self, chunk_count: usize) {
        if chunk_count <= self.slots.len() {
            return;
        }

        let new_len = (chunk_count / self.batch + 1) * self.batch;
        log::debug!(
            "Growing map chunk slots {} -> {} for {} chunks",
            self.slots.len(),
            new_len,
            chunk_count
        );
        self.slots.resize_with(new_len, GpuMesh::default);
    }

    /// Re-uploads one chunk. The caller decides whether the chunk changed.
    ///
    /// Panics if `index` is outside the reserved slots.
    pub fn sync_chunk<U>(&mut self, uploader: &U, index: usize, chunk: &PointCloudChunk)
    where
        U: Uploader<Buffer = B>,
    {
        self.slots[index].upload(uploader, "Map Chunk", &chunk.vertices);
    }

    /// Brings every changed chunk of `cloud` up to date. Returns how many were uploaded.
    pub fn sync_from<U>(&mut self, uploader: &U, cloud: &FusedPointCloud) -> usize
    where
        U: Uploader<Buffer = B>,
    {
        self.reserve_for(cloud.chunks.len());

        let mut synced = 0;
        for (index, chunk) in cloud.chunks.iter().enumerate() {
            if chunk.has_been_updated {
                self.sync_chunk(uploader, index, chunk);
                synced += 1;
            }
        }
        synced
    }
}

impl ChunkedMap<wgpu::Buffer> {
    /// Issues one point-list draw per non-empty chunk.
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        for slot in self.slots.iter().filter(|s| s.count() > 0) {
            slot.draw(rpass);
        }
    }
}

impl<B> Default for ChunkedMap<B> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_BATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::PointVertex;
    use crate::renderer::upload::fake::{FakeBuffer, RecordingUploader};
    use glam::Vec3;

    fn chunk(points: usize, updated: bool) -> PointCloudChunk {
        PointCloudChunk {
            vertices: (0..points)
                .map(|i| PointVertex::new(Vec3::splat(i as f32), [1, 2, 3]))
                .collect(),
            has_been_updated: updated,
        }
    }

    #[test]
    fn reserve_rounds_up_to_batch_multiple() {
        for n in [0usize, 1, 499, 500, 501, 999, 1000, 1234, 5000] {
            let mut map = ChunkedMap::<FakeBuffer>::new(DEFAULT_CHUNK_BATCH);
            map.reserve_for(n);
            assert!(map.slot_count() >= n);
            assert_eq!(map.slot_count() % DEFAULT_CHUNK_BATCH, 0);
        }
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut map = ChunkedMap::<FakeBuffer>::default();
        let mut last = 0;
        for n in [0usize, 3, 3, 600, 600, 601, 1400, 2001] {
            map.reserve_for(n);
            assert!(map.slot_count() >= last);
            last = map.slot_count();
        }

        // A smaller count later in the session keeps the slots.
        map.reserve_for(10);
        assert_eq!(map.slot_count(), last);
    }

    #[test]
    fn growing_past_one_batch_allocates_two() {
        let mut map = ChunkedMap::<FakeBuffer>::new(500);
        map.reserve_for(0);
        assert_eq!(map.slot_count(), 0);
        map.reserve_for(501);
        assert_eq!(map.slot_count(), 1000);
    }

    #[test]
    fn only_updated_chunks_are_uploaded() {
        let up = RecordingUploader::default();
        let mut map = ChunkedMap::default();
        let mut cloud = FusedPointCloud {
            chunks: vec![chunk(10, true), chunk(5, false), chunk(7, true)],
        };

        assert_eq!(map.sync_from(&up, &cloud), 2);
        assert_eq!(map.slot_count(), 500);
        assert_eq!(map.chunk_len(0), Some(10));
        assert_eq!(map.chunk_len(1), Some(0));
        assert_eq!(map.chunk_len(2), Some(7));
        assert_eq!(map.point_count(), 17);
        // vertex + index buffer for each of the two chunks
        assert_eq!(up.writes(), 4);

        for c in &mut cloud.chunks {
            c.has_been_updated = false;
        }
        cloud.chunks[1] = chunk(6, true);
        assert_eq!(map.sync_from(&up, &cloud), 1);
        assert_eq!(up.writes(), 6);
        assert_eq!(map.point_count(), 23);
    }

    #[test]
    fn refreshed_chunk_replaces_previous_points() {
        let up = RecordingUploader::default();
        let mut map = ChunkedMap::default();
        map.reserve_for(1);

        map.sync_chunk(&up, 0, &chunk(100, true));
        map.sync_chunk(&up, 0, &chunk(40, true));
        assert_eq!(map.chunk_len(0), Some(40));
        // The shrunk chunk fits the existing allocation.
        assert_eq!(up.created(), 2);

        let log = up.log.borrow();
        let (_, last_index_write) = log.writes.last().unwrap();
        let indices: Vec<u32> = last_index_write
            .chunks_exact(4)
            .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(indices.len(), 40);
        assert!(indices.iter().enumerate().all(|(i, &v)| v == i as u32));
    }

    #[test]
    fn empty_cloud_allocates_nothing() {
        let up = RecordingUploader::default();
        let mut map = ChunkedMap::default();
        assert_eq!(map.sync_from(&up, &FusedPointCloud::default()), 0);
        assert_eq!(map.slot_count(), 0);
        assert_eq!(up.created(), 0);
    }
}
