// src/lib.rs
//! Real-time viewer for a fused point-cloud map.
//!
//! A capture thread feeds sensor poses and chunked map refreshes through a
//! [`ViewerHandle`]; the thread owning the [`Viewer`] pumps the window,
//! uploads changed chunks and draws the map, the trajectory trail and the
//! sensor housing with wgpu.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod input;
pub mod registry;
pub mod renderer;
pub mod source;
pub mod state;
pub mod ui;
pub mod viewer;

pub use crate::error::ViewerError;
pub use crate::viewer::{Viewer, ViewerHandle};
