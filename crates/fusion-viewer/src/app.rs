use crate::{
    camera::PoseCamera,
    config::ViewerSettings,
    data::{
        map::ChunkedMap,
        model::housing_triangles,
        object::RenderObject,
        types::{DeviceModel, FusedPointCloud, Pose, TrackingState},
    },
    error::ViewerError,
    input::{CameraController, InputAction, InputState},
    renderer::{upload::Uploader, Renderer, Scene},
    state::SharedState,
    ui::{self, HudStats},
};
use glam::Vec3;
use parking_lot::RwLock;
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

/// Field of view, in degrees, of a pinhole with `focal_px` spanning `size_px` pixels.
pub fn fov_for_viewport(size_px: u32, focal_px: f32) -> f32 {
    (2.0 * (size_px as f32 / (2.0 * focal_px)).atan()).to_degrees()
}

/// Everything the render thread updates once per frame, independent of the window.
pub struct ViewerScene<B = wgpu::Buffer> {
    pub settings: ViewerSettings,
    pub camera: PoseCamera,
    pub controller: CameraController,
    pub map: ChunkedMap<B>,
    pub trail: RenderObject<B>,
    pub housing: RenderObject<B>,
    pub tracking: TrackingState,
    /// Latest pose received from the producer, if any arrived yet.
    last_pose: Option<Pose>,
    /// Chunk count of the map as of the last sync.
    chunk_count: usize,
}

impl<B> ViewerScene<B> {
    pub fn new(settings: ViewerSettings, model: DeviceModel) -> Self {
        let mut camera = PoseCamera::new(
            Vec3::new(0.0, 0.0, 1000.0),
            Vec3::new(0.0, 0.0, -100.0),
            Vec3::Y,
        );
        camera.set_offset_from_position(Vec3::new(0.0, 0.0, settings.follow_distance));
        camera.update();

        let mut housing = RenderObject::fixed("Sensor Housing");
        housing.extend(housing_triangles(model));

        Self {
            controller: CameraController::new(settings.start_following),
            map: ChunkedMap::new(settings.chunk_batch),
            trail: RenderObject::dynamic("Trajectory Trail"),
            housing,
            camera,
            tracking: TrackingState::Off,
            last_pose: None,
            chunk_count: 0,
            settings,
        }
    }

    /// Derives the projection from a new viewport size, keeping near/far.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let focal = self.settings.view_focal_px;
        let (near, far) = (self.camera.z_near(), self.camera.z_far());
        self.camera.set_projection(
            fov_for_viewport(width, focal),
            fov_for_viewport(height, focal),
            near,
            far,
        );
    }

    /// One render-thread tick: input, staged producer data, camera, GPU sync.
    ///
    /// The mailbox lock is only held inside `begin_frame` and
    /// `finish_chunk_sync`; the map is read-locked while its chunks upload.
    pub fn tick<U>(
        &mut self,
        uploader: &U,
        input: &InputState,
        shared: &SharedState,
        cloud: &RwLock<FusedPointCloud>,
    ) -> InputAction
    where
        U: Uploader<Buffer = B>,
    {
        let action = self.controller.apply(input, &mut self.camera, &self.settings);

        let frame = shared.begin_frame();
        self.tracking = frame.tracking;
        if frame.pose_changed {
            self.last_pose = Some(frame.pose);
            self.housing.set_transform(&frame.pose);
        }
        if let Some(pose) = &self.last_pose {
            self.controller.follow(&mut self.camera, pose);
        }
        self.camera.update();

        if !frame.new_points.is_empty() {
            let color = self.settings.trail_color;
            for p in frame.new_points {
                self.trail.add_point(p, color);
            }
            self.trail.flush(uploader);
        }

        if frame.sync_chunks {
            let synced = {
                let cloud = cloud.read();
                self.chunk_count = cloud.chunks.len();
                self.map.sync_from(uploader, &cloud)
            };
            shared.finish_chunk_sync();
            log::debug!(
                "Synced {} map chunks ({} slots, {} points)",
                synced,
                self.map.slot_count(),
                self.map.point_count()
            );
        }

        action
    }

    /// Number of map chunks on the GPU.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn hud_stats(&self) -> HudStats {
        HudStats {
            tracking: self.tracking,
            following: self.controller.is_following(),
            chunks: self.chunk_count,
            points: self.map.point_count(),
        }
    }
}

/// The window-bound half of the viewer: GPU renderer, egui and the scene.
pub struct App {
    pub window: Arc<Window>,
    pub renderer: Renderer,
    pub scene: ViewerScene,
    pub input: InputState,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    shared: Arc<SharedState>,
    cloud: Arc<RwLock<FusedPointCloud>>,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        settings: ViewerSettings,
        model: DeviceModel,
        shared: Arc<SharedState>,
        cloud: Arc<RwLock<FusedPointCloud>>,
    ) -> Result<Self, ViewerError> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        let mut scene = ViewerScene::new(settings, model);
        scene.set_viewport(size.width, size.height);
        scene.housing.flush(&renderer.gfx);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            window,
            renderer,
            scene,
            input: InputState::new(),
            egui_ctx,
            egui_state,
            shared,
            cloud,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.scene.set_viewport(new_size.width, new_size.height);
        }
    }

    /// Returns true when the window asked to close.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => return true,
            WindowEvent::Resized(physical_size) => self.resize(*physical_size),
            _ => {}
        }

        let response = self.egui_state.on_window_event(&self.window, event);
        if !response.consumed {
            self.input.handle_event(event);
        }
        false
    }

    /// Runs one tick and presents the frame.
    pub fn frame(&mut self) -> Result<InputAction, wgpu::SurfaceError> {
        let action = self
            .scene
            .tick(&self.renderer.gfx, &self.input, &self.shared, &self.cloud);
        self.input.end_frame();
        if action == InputAction::Exit {
            return Ok(action);
        }

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &swap_view,
            &Scene {
                camera: &self.scene.camera,
                map: &self.scene.map,
                trail: &self.scene.trail,
                housing: &self.scene.housing,
                background: self.scene.settings.background,
            },
        );

        let stats = self.scene.hud_stats();
        self.draw_ui(&swap_view, &stats);

        frame.present();
        Ok(action)
    }

    fn draw_ui(&mut self, swap_view: &wgpu::TextureView, stats: &HudStats) {
        let egui_input = self.egui_state.take_egui_input(&self.window);
        self.egui_ctx.begin_frame(egui_input);
        ui::draw_hud(&self.egui_ctx, stats);
        let egui_output = self.egui_ctx.end_frame();

        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output);

        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
    }
}
