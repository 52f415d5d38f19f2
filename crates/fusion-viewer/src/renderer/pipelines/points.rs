use crate::data::map::ChunkedMap;
use crate::data::types::PointVertex;
use crate::renderer::pipelines::{build_pipeline, UniformSlot};

/// Draws the fused map chunks as a point list.
pub struct PointsPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        uniform_layout: &wgpu::BindGroupLayout,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position (vec3)
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Packed colour (uint)
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 12,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        };

        let pipeline = build_pipeline(
            device,
            "Map Points Pipeline",
            POINTS_WGSL,
            vertex_layout,
            wgpu::PrimitiveTopology::PointList,
            uniform_layout,
            color_fmt,
            depth_fmt,
        );

        Self { pipeline }
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        uniform: &'a UniformSlot,
        map: &'a ChunkedMap,
    ) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &uniform.bind, &[]);
        map.draw(rpass);
    }
}

pub const POINTS_WGSL: &str = r#"
struct DrawUniform {
    mvp: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> U: DrawUniform;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) packed: u32) -> VSOut {
    let srgb = vec3<f32>(
        f32((packed >> 16u) & 0xFFu),
        f32((packed >> 8u) & 0xFFu),
        f32(packed & 0xFFu),
    ) / 255.0;

    var out: VSOut;
    out.clip = U.mvp * vec4<f32>(position, 1.0);
    // The swap chain is sRGB; hand it linear values.
    out.color = pow(srgb, vec3<f32>(2.2));
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
