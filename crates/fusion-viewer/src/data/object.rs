//! Simple coloured meshes: the trajectory trail and the sensor housing.

use crate::data::types::{ColorVertex, Pose};
use crate::renderer::upload::{GpuMesh, Uploader};
use glam::{Mat4, Quat, Vec3};

/// A CPU-side vertex list mirrored to the GPU on [`flush`](Self::flush).
///
/// A static object uploads once; later flushes are ignored and the object is
/// only moved through its model transform.
pub struct RenderObject<B = wgpu::Buffer> {
    label: &'static str,
    vertices: Vec<ColorVertex>,
    is_static: bool,
    mesh: GpuMesh<B>,
    position: Vec3,
    rotation: Quat,
}

impl<B> RenderObject<B> {
    /// An object re-uploaded wholesale on every flush.
    pub fn dynamic(label: &'static str) -> Self {
        Self::new(label, false)
    }

    /// An object uploaded exactly once.
    pub fn fixed(label: &'static str) -> Self {
        Self::new(label, true)
    }

    fn new(label: &'static str, is_static: bool) -> Self {
        Self {
            label,
            vertices: Vec::new(),
            is_static,
            mesh: GpuMesh::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn add_point(&mut self, position: Vec3, color: Vec3) {
        self.vertices.push(ColorVertex {
            position: position.to_array(),
            color: color.to_array(),
        });
    }

    pub fn add_line(&mut self, a: Vec3, b: Vec3, color: Vec3) {
        self.add_point(a, color);
        self.add_point(b, color);
    }

    pub fn extend(&mut self, vertices: impl IntoIterator<Item = ColorVertex>) {
        self.vertices.extend(vertices);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// CPU-side vertices, in insertion order.
    pub fn vertices(&self) -> &[ColorVertex] {
        &self.vertices
    }

    /// Number of vertices currently on the GPU.
    pub fn uploaded_len(&self) -> u32 {
        self.mesh.count()
    }

    /// Uploads the vertex list. Static objects upload only the first time.
    pub fn flush<U>(&mut self, uploader: &U)
    where
        U: Uploader<Buffer = B>,
    {
        if self.is_static && self.mesh.is_allocated() {
            return;
        }
        self.mesh.upload(uploader, self.label, &self.vertices);
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.position = p;
    }

    pub fn set_rotation(&mut self, r: Quat) {
        self.rotation = r;
    }

    /// Places the object at a tracked pose.
    pub fn set_transform(&mut self, pose: &Pose) {
        self.position = pose.translation;
        self.rotation = pose.rotation;
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

impl RenderObject<wgpu::Buffer> {
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        self.mesh.draw(rpass);
    }
}
