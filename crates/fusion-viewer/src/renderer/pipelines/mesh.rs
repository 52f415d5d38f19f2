use crate::data::object::RenderObject;
use crate::data::types::ColorVertex;
use crate::renderer::pipelines::{build_pipeline, UniformSlot};

/// Draws [`RenderObject`]s with a fixed primitive topology.
pub struct MeshPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub topology: wgpu::PrimitiveTopology,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        topology: wgpu::PrimitiveTopology,
        uniform_layout: &wgpu::BindGroupLayout,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 12,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        };

        let label = format!("Mesh Pipeline ({topology:?})");
        let pipeline = build_pipeline(
            device,
            &label,
            MESH_WGSL,
            vertex_layout,
            topology,
            uniform_layout,
            color_fmt,
            depth_fmt,
        );

        Self { pipeline, topology }
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        uniform: &'a UniformSlot,
        object: &'a RenderObject,
    ) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &uniform.bind, &[]);
        object.draw(rpass);
    }
}

pub const MESH_WGSL: &str = r#"
struct DrawUniform {
    mvp: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> U: DrawUniform;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VSOut {
    var out: VSOut;
    out.clip = U.mvp * vec4<f32>(position, 1.0);
    out.color = pow(color, vec3<f32>(2.2));
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
