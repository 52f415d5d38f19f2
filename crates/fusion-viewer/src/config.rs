use crate::data::types::DeviceModel;
use clap::Parser;
use glam::Vec3;

/// Tunables of the viewer window and camera controls.
///
/// Distances are in the mapping service's unit (millimetres).
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// sRGB clear colour, each channel in `[0, 1]`.
    pub background: [f64; 3],
    pub trail_color: Vec3,
    /// Map chunk slots are allocated in multiples of this.
    pub chunk_batch: usize,

    /// Radians of rotation per pixel of left-drag.
    pub rotation_sensitivity: f32,
    /// Units of translation per pixel of right-drag.
    pub pan_sensitivity: f32,
    /// Offset scale per wheel step towards the target.
    pub zoom_in_factor: f32,
    /// Offset scale per wheel step away from the target.
    pub zoom_out_factor: f32,
    /// Eye distance behind the sensor when following it.
    pub follow_distance: f32,
    pub follow_min_distance: f32,
    pub follow_max_distance: f32,
    pub free_min_distance: f32,

    /// Focal length, in pixels, used to derive the field of view from the window size.
    pub view_focal_px: f32,
    pub start_following: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            title: "Fused Point Cloud Viewer".to_owned(),
            window_width: 1280,
            window_height: 720,
            background: [37.0 / 255.0, 42.0 / 255.0, 44.0 / 255.0],
            trail_color: Vec3::new(0.1, 0.5, 0.9),
            chunk_batch: crate::data::map::DEFAULT_CHUNK_BATCH,
            rotation_sensitivity: 0.025,
            pan_sensitivity: 80.0,
            zoom_in_factor: 0.75,
            zoom_out_factor: 1.25,
            follow_distance: 1500.0,
            follow_min_distance: 500.0,
            follow_max_distance: 5000.0,
            free_min_distance: 50.0,
            view_focal_px: 500.0,
            start_following: true,
        }
    }
}

/// `fusion_viewer` - live view of a fused point-cloud map.
///
/// Runs a synthetic mapping service on a capture thread and renders the
/// growing map, the sensor trajectory and the sensor housing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Sensor housing drawn at the tracked pose.
    #[arg(long, value_enum, default_value_t = DeviceModel::Zed, env = "FUSION_DEVICE_MODEL")]
    pub device_model: DeviceModel,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Start in free-fly mode instead of following the sensor.
    #[arg(long)]
    pub free_fly: bool,

    /// Points per synthetic map chunk.
    #[arg(long, default_value_t = 4096, env = "FUSION_CHUNK_POINTS")]
    pub chunk_points: usize,

    /// New synthetic chunks discovered per map refresh.
    #[arg(long, default_value_t = 3)]
    pub chunks_per_refresh: usize,

    /// Synthetic capture period in milliseconds.
    #[arg(long, default_value_t = 15)]
    pub frame_period_ms: u64,

    /// Minimum time between two map refresh requests, in milliseconds.
    #[arg(long, default_value_t = 30)]
    pub map_request_interval_ms: u64,
}

impl Cli {
    pub fn viewer_settings(&self) -> ViewerSettings {
        ViewerSettings {
            window_width: self.width,
            window_height: self.height,
            start_following: !self.free_fly,
            ..ViewerSettings::default()
        }
    }
}
