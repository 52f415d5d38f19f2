//! Errors surfaced while bringing the viewer up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("another viewer is already active in this process")]
    AlreadyActive,

    #[error("failed to create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create the window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create the rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to open the GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
