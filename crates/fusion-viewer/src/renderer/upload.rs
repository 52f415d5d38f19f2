//! Buffer upload seam between the renderable objects and the GPU.
//!
//! Renderables only ever see an [`Uploader`]; the wgpu implementation lives on
//! [`GfxContext`](super::context::GfxContext). Buffers are owned by a
//! [`GpuMesh`], created on first upload and released when the mesh drops.

use bytemuck::Pod;

/// Creates and rewrites GPU buffers.
pub trait Uploader {
    type Buffer;

    /// Allocates an uninitialised buffer of `size` bytes.
    fn create_buffer(&self, label: &str, usage: wgpu::BufferUsages, size: u64) -> Self::Buffer;

    /// Overwrites the start of `buffer` with `contents`.
    fn write_buffer(&self, buffer: &Self::Buffer, contents: &[u8]);

    /// Allocated size of `buffer` in bytes.
    fn buffer_size(buffer: &Self::Buffer) -> u64;
}

/// A vertex buffer plus its trivial `0..n` index buffer.
#[derive(Debug)]
pub struct GpuMesh<B> {
    vertex: Option<B>,
    index: Option<B>,
    count: u32,
}

impl<B> Default for GpuMesh<B> {
    fn default() -> Self {
        Self {
            vertex: None,
            index: None,
            count: 0,
        }
    }
}

impl<B> GpuMesh<B> {
    /// Number of indices drawn.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// True once GPU buffers have been acquired.
    pub fn is_allocated(&self) -> bool {
        self.vertex.is_some()
    }

    /// Replaces the mesh contents: vertex buffer first, then the index buffer.
    ///
    /// Existing buffers are rewritten in place; a buffer is only reallocated
    /// when the new contents no longer fit.
    pub fn upload<U, V>(&mut self, uploader: &U, label: &str, vertices: &[V])
    where
        U: Uploader<Buffer = B>,
        V: Pod,
    {
        if vertices.is_empty() {
            self.count = 0;
            return;
        }

        let indices: Vec<u32> = (0..vertices.len() as u32).collect();

        write_or_grow(
            uploader,
            &mut self.vertex,
            label,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            bytemuck::cast_slice(vertices),
        );
        write_or_grow(
            uploader,
            &mut self.index,
            label,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            bytemuck::cast_slice(&indices),
        );

        self.count = indices.len() as u32;
    }
}

impl GpuMesh<wgpu::Buffer> {
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        let (Some(vertex), Some(index)) = (&self.vertex, &self.index) else {
            return;
        };
        if self.count == 0 {
            return;
        }

        rpass.set_vertex_buffer(0, vertex.slice(..));
        rpass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.count, 0, 0..1);
    }
}

fn write_or_grow<U: Uploader>(
    uploader: &U,
    slot: &mut Option<U::Buffer>,
    label: &str,
    usage: wgpu::BufferUsages,
    bytes: &[u8],
) {
    let len = bytes.len() as u64;

    match slot {
        Some(buffer) if U::buffer_size(buffer) >= len => uploader.write_buffer(buffer, bytes),
        _ => {
            // Round up so a chunk that keeps growing does not reallocate every refresh.
            let capacity = len.next_power_of_two().max(wgpu::COPY_BUFFER_ALIGNMENT);
            let buffer = uploader.create_buffer(label, usage, capacity);
            uploader.write_buffer(&buffer, bytes);
            *slot = Some(buffer);
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::Uploader;
    use std::cell::RefCell;

    /// A CPU-side buffer standing in for a GPU allocation.
    #[derive(Debug)]
    pub struct FakeBuffer {
        pub id: usize,
        pub size: u64,
    }

    #[derive(Debug, Default)]
    pub struct Log {
        pub created: Vec<(String, u64)>,
        /// (buffer id, bytes written)
        pub writes: Vec<(usize, Vec<u8>)>,
    }

    /// Records every allocation and write instead of touching a device.
    #[derive(Default)]
    pub struct RecordingUploader {
        pub log: RefCell<Log>,
    }

    impl RecordingUploader {
        pub fn created(&self) -> usize {
            self.log.borrow().created.len()
        }

        pub fn writes(&self) -> usize {
            self.log.borrow().writes.len()
        }
    }

    impl Uploader for RecordingUploader {
        type Buffer = FakeBuffer;

        fn create_buffer(&self, label: &str, _usage: wgpu::BufferUsages, size: u64) -> FakeBuffer {
            let mut log = self.log.borrow_mut();
            log.created.push((label.to_owned(), size));
            FakeBuffer {
                id: log.created.len() - 1,
                size,
            }
        }

        fn write_buffer(&self, buffer: &FakeBuffer, contents: &[u8]) {
            assert!(contents.len() as u64 <= buffer.size, "write past end of buffer");
            self.log
                .borrow_mut()
                .writes
                .push((buffer.id, contents.to_vec()));
        }

        fn buffer_size(buffer: &FakeBuffer) -> u64 {
            buffer.size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::RecordingUploader;
    use super::*;

    #[test]
    fn first_upload_writes_vertices_then_indices() {
        let up = RecordingUploader::default();
        let mut mesh = GpuMesh::default();
        mesh.upload(&up, "test", &[[1.0f32; 4], [2.0f32; 4], [3.0f32; 4]]);

        assert_eq!(mesh.count(), 3);
        let log = up.log.borrow();
        assert_eq!(log.created.len(), 2);
        assert_eq!(log.writes.len(), 2);
        assert_eq!(log.writes[0].1.len(), 48);
        let indices: Vec<u32> = log.writes[1]
            .1
            .chunks_exact(4)
            .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn smaller_upload_reuses_buffers() {
        let up = RecordingUploader::default();
        let mut mesh = GpuMesh::default();
        mesh.upload(&up, "test", &[[0u32; 4]; 10]);
        mesh.upload(&up, "test", &[[0u32; 4]; 4]);

        assert_eq!(up.created(), 2);
        assert_eq!(up.writes(), 4);
        assert_eq!(mesh.count(), 4);
    }

    #[test]
    fn outgrowing_capacity_reallocates() {
        let up = RecordingUploader::default();
        let mut mesh = GpuMesh::default();
        mesh.upload(&up, "test", &[[0u32; 4]; 2]);
        mesh.upload(&up, "test", &[[0u32; 4]; 3]);

        // 32 B → 48 B exceeds the 32 B allocation for vertices; the 8 B index
        // buffer grows to 12 B as well.
        assert_eq!(up.created(), 4);
        assert_eq!(mesh.count(), 3);
    }

    #[test]
    fn empty_upload_keeps_buffers_and_draws_nothing() {
        let up = RecordingUploader::default();
        let mut mesh = GpuMesh::default();
        mesh.upload(&up, "test", &[[0u32; 4]; 2]);
        mesh.upload::<_, [u32; 4]>(&up, "test", &[]);

        assert!(mesh.is_allocated());
        assert_eq!(mesh.count(), 0);
        assert_eq!(up.created(), 2);
    }
}
