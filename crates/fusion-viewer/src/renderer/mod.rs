//! The main rendering orchestrator. Owns the GPU context, the depth target
//! and the pipelines for map points, trail lines and housing triangles.

pub mod context;
pub mod pipelines;
pub mod targets;
pub mod upload;

use self::{
    context::GfxContext,
    pipelines::{
        draw_uniform_layout, mesh::MeshPipeline, points::PointsPipeline, UniformSlot,
    },
    targets::Targets,
};
use crate::{camera::PoseCamera, data::map::ChunkedMap, data::object::RenderObject};
use std::sync::Arc;
use winit::window::Window;

/// Converts an sRGB colour to the linear clear value of an sRGB swap chain,
/// with the same gamma the shaders apply to vertex colours.
pub fn clear_color([r, g, b]: [f64; 3]) -> wgpu::Color {
    wgpu::Color {
        r: r.powf(2.2),
        g: g.powf(2.2),
        b: b.powf(2.2),
        a: 1.0,
    }
}

/// Everything drawn in the scene pass of one frame.
pub struct Scene<'a> {
    pub camera: &'a PoseCamera,
    pub map: &'a ChunkedMap,
    pub trail: &'a RenderObject,
    pub housing: &'a RenderObject,
    pub background: [f64; 3],
}

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub lines: MeshPipeline,
    pub triangles: MeshPipeline,
    scene_ubo: UniformSlot,
    model_ubo: UniformSlot,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, crate::error::ViewerError> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;
        let color_fmt = gfx.config.format;

        let targets = Targets::new(&gfx.device, size);
        let layout = draw_uniform_layout(&gfx.device);

        let points = PointsPipeline::new(&gfx.device, &layout, color_fmt, targets.depth_fmt);
        let lines = MeshPipeline::new(
            &gfx.device,
            wgpu::PrimitiveTopology::LineStrip,
            &layout,
            color_fmt,
            targets.depth_fmt,
        );
        let triangles = MeshPipeline::new(
            &gfx.device,
            wgpu::PrimitiveTopology::TriangleList,
            &layout,
            color_fmt,
            targets.depth_fmt,
        );

        let scene_ubo = UniformSlot::new(&gfx.device, &layout, "Scene UBO");
        let model_ubo = UniformSlot::new(&gfx.device, &layout, "Housing UBO");

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, color_fmt, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            lines,
            triangles,
            scene_ubo,
            model_ubo,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    pub fn render(&mut self, swap_view: &wgpu::TextureView, scene: &Scene<'_>) {
        let view_proj = scene.camera.view_proj_wgpu();
        self.scene_ubo.write(&self.gfx.queue, view_proj);
        self.model_ubo
            .write(&self.gfx.queue, view_proj * scene.housing.model_matrix());

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.lines.draw(&mut pass, &self.scene_ubo, scene.trail);
            self.triangles.draw(&mut pass, &self.model_ubo, scene.housing);
            self.points.draw(&mut pass, &self.scene_ubo, scene.map);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
