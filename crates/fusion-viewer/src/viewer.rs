//! Public face of the viewer for the embedding application.
//!
//! The thread that calls [`Viewer::init`] owns the window and must keep
//! calling [`Viewer::is_available`], which pumps window events and draws one
//! frame. Capture threads talk to the viewer through a [`ViewerHandle`].

use crate::{
    app::App,
    config::ViewerSettings,
    data::types::{CameraIntrinsics, DeviceModel, FusedPointCloud, Pose, TrackingState},
    error::ViewerError,
    input::InputAction,
    registry::InstanceGuard,
    state::SharedState,
};
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use winit::{
    event::Event,
    event_loop::EventLoop,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::WindowBuilder,
};

/// Cloneable producer-side access to a running viewer.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    shared: Arc<SharedState>,
}

impl ViewerHandle {
    pub fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Stages a new sensor pose and extends the trajectory.
    pub fn update_pose(&self, pose: Pose, tracking: TrackingState) {
        self.shared.on_pose_update(pose, tracking);
    }

    /// Signals that the shared map holds a freshly retrieved batch.
    pub fn update_chunks(&self) {
        self.shared.on_chunks_available();
    }

    /// True once the last signalled batch is on the GPU.
    pub fn chunks_updated(&self) -> bool {
        self.shared.chunks_updated()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn exit(&self) {
        self.shared.request_exit();
    }
}

/// The window, its renderer and the process-wide instance slot.
pub struct Viewer {
    // Declared first: GPU resources go before the event loop and the slot.
    app: App,
    event_loop: EventLoop<()>,
    shared: Arc<SharedState>,
    intrinsics: CameraIntrinsics,
    _guard: InstanceGuard,
}

impl Viewer {
    /// Opens the window and uploads the sensor housing.
    pub fn init(
        settings: ViewerSettings,
        intrinsics: CameraIntrinsics,
        map: Arc<RwLock<FusedPointCloud>>,
        model: DeviceModel,
    ) -> Result<Self, ViewerError> {
        let guard = InstanceGuard::acquire()?;

        let event_loop = EventLoop::new()?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(settings.title.as_str())
                .with_inner_size(winit::dpi::LogicalSize::new(
                    settings.window_width,
                    settings.window_height,
                ))
                .build(&event_loop)?,
        );

        let (h_fov, v_fov) = intrinsics.fov_deg();
        log::info!(
            "Sensor {:?}: {}x{} px, fov {:.1} x {:.1} deg",
            model,
            intrinsics.width,
            intrinsics.height,
            h_fov,
            v_fov
        );

        let shared = Arc::new(SharedState::new());
        let app = pollster::block_on(App::new(window, settings, model, shared.clone(), map))?;

        Ok(Self {
            app,
            event_loop,
            shared,
            intrinsics,
            _guard: guard,
        })
    }

    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle::new(self.shared.clone())
    }

    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    /// Pumps pending window events and renders one frame.
    ///
    /// Returns false once the window was closed, `Q`/`Esc` was pressed or
    /// [`exit`](Self::exit) was called.
    pub fn is_available(&mut self) -> bool {
        if !self.shared.is_running() {
            return false;
        }

        let app = &mut self.app;
        let window_id = app.window.id();
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, elwt| match event {
                Event::WindowEvent { window_id: id, event } if id == window_id => {
                    if app.handle_event(&event) {
                        elwt.exit();
                    }
                }
                Event::AboutToWait => app.window.request_redraw(),
                _ => {}
            });

        if let PumpStatus::Exit(code) = status {
            log::info!("Window closed (code {})", code);
            self.shared.request_exit();
            return false;
        }

        match self.app.frame() {
            Ok(InputAction::Continue) => {}
            Ok(InputAction::Exit) => {
                log::info!("Exit requested from the keyboard");
                self.shared.request_exit();
            }
            Err(wgpu::SurfaceError::Lost) => {
                let size = self.app.renderer.gfx.size;
                self.app.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("WGPU out of memory, exiting.");
                self.shared.request_exit();
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }

        self.shared.is_running()
    }

    pub fn update_pose(&self, pose: Pose, tracking: TrackingState) {
        self.shared.on_pose_update(pose, tracking);
    }

    pub fn update_chunks(&self) {
        self.shared.on_chunks_available();
    }

    pub fn chunks_updated(&self) -> bool {
        self.shared.chunks_updated()
    }

    /// Stops the viewer; the next [`is_available`](Self::is_available) returns false.
    pub fn exit(&self) {
        self.shared.request_exit();
    }
}
