//! Mouse and keyboard handling for the viewer camera.
//!
//! Window events are coalesced into an [`InputState`] between two frames and
//! consumed once per frame by the [`CameraController`].

use crate::camera::PoseCamera;
use crate::config::ViewerSettings;
use crate::data::types::Pose;
use glam::{DVec2, Quat, Vec3};
use std::collections::HashMap;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Down,
    /// Released since the last frame. Key actions fire on release.
    Released,
}

/// Input accumulated since the last frame.
#[derive(Debug, Default)]
pub struct InputState {
    left: bool,
    middle: bool,
    right: bool,
    cursor: Option<DVec2>,
    /// Cursor travel while a button was held, in pixels.
    motion: DVec2,
    /// Wheel steps, positive towards the scene.
    wheel: f32,
    keys: HashMap<KeyCode, KeyState>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one window event into the state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => self.release_button(*button),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.scroll(steps);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.key_pressed(code),
                        ElementState::Released => self.key_released(code),
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.left = false;
                self.middle = false;
                self.right = false;
            }
            _ => {}
        }
    }

    pub fn press_button(&mut self, button: MouseButton) {
        self.set_button(button, true);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.set_button(button, false);
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left = down,
            MouseButton::Middle => self.middle = down,
            MouseButton::Right => self.right = down,
            _ => {}
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        let pos = DVec2::new(x, y);
        if let Some(last) = self.cursor {
            if self.left || self.middle || self.right {
                self.motion += pos - last;
            }
        }
        self.cursor = Some(pos);
    }

    pub fn scroll(&mut self, steps: f32) {
        self.wheel += steps;
    }

    pub fn key_pressed(&mut self, key: KeyCode) {
        self.keys.insert(key, KeyState::Down);
    }

    pub fn key_released(&mut self, key: KeyCode) {
        self.keys.insert(key, KeyState::Released);
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.keys.get(&key) == Some(&KeyState::Down)
    }

    pub fn was_released(&self, key: KeyCode) -> bool {
        self.keys.get(&key) == Some(&KeyState::Released)
    }

    pub fn left_down(&self) -> bool {
        self.left
    }

    pub fn right_down(&self) -> bool {
        self.right
    }

    pub fn motion(&self) -> DVec2 {
        self.motion
    }

    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    /// Clears per-frame input. Held buttons and keys stay latched.
    pub fn end_frame(&mut self) {
        self.motion = DVec2::ZERO;
        self.wheel = 0.0;
        self.keys.retain(|_, state| *state == KeyState::Down);
    }
}

/// What the frame should do after input was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Continue,
    Exit,
}

/// Drives the camera from user input, or from the tracked pose in follow mode.
#[derive(Debug)]
pub struct CameraController {
    following: bool,
}

impl CameraController {
    pub fn new(following: bool) -> Self {
        Self { following }
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Applies this frame's input to the camera. Does not call `camera.update()`.
    pub fn apply(
        &mut self,
        input: &InputState,
        camera: &mut PoseCamera,
        settings: &ViewerSettings,
    ) -> InputAction {
        if [KeyCode::KeyQ, KeyCode::Escape]
            .into_iter()
            .any(|k| input.was_released(k))
        {
            return InputAction::Exit;
        }

        if input.was_released(KeyCode::KeyF) {
            self.following = !self.following;
            if self.following {
                camera.set_offset_from_position(Vec3::new(0.0, 0.0, settings.follow_distance));
            }
            log::info!("Camera follow {}", if self.following { "on" } else { "off" });
        }

        let motion = input.motion().as_vec2();
        if !self.following {
            if input.left_down() && motion != glam::Vec2::ZERO {
                let s = settings.rotation_sensitivity;
                camera.rotate(Quat::from_axis_angle(camera.right(), motion.y * s));
                camera.rotate(Quat::from_axis_angle(-camera.vertical(), motion.x * s));
            }

            if input.right_down() && motion != glam::Vec2::ZERO {
                let s = settings.pan_sensitivity;
                camera.translate(camera.up() * motion.y * s);
                camera.translate(camera.right() * motion.x * s);
            }
        }

        if input.wheel() != 0.0 {
            self.zoom(input.wheel() > 0.0, camera, settings);
        }

        InputAction::Continue
    }

    fn zoom(&self, towards: bool, camera: &mut PoseCamera, settings: &ViewerSettings) {
        let factor = if towards {
            settings.zoom_in_factor
        } else {
            settings.zoom_out_factor
        };
        let mut offset = camera.offset_from_position() * factor;

        if towards {
            let min = if self.following {
                settings.follow_min_distance
            } else {
                settings.free_min_distance
            };
            offset.z = offset.z.max(min);
        } else if self.following {
            offset.z = offset.z.min(settings.follow_max_distance);
        }

        camera.set_offset_from_position(offset);
    }

    /// Snaps the camera onto the tracked pose when following.
    pub fn follow(&self, camera: &mut PoseCamera, pose: &Pose) {
        if self.following {
            camera.set_position(pose.translation);
            camera.set_rotation(pose.rotation);
        }
    }
}
