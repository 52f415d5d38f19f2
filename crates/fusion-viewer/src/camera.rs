use glam::{Mat4, Quat, Vec3, Vec4};

/// This matrix converts clip-space coordinates from OpenGL conventions (Z in [-1, 1])
/// to WebGPU conventions (Z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

/// Canonical axes of an unrotated camera. The camera looks down `-ORIGINAL_FORWARD`,
/// as an OpenGL eye does.
pub const ORIGINAL_FORWARD: Vec3 = Vec3::Z;
pub const ORIGINAL_UP: Vec3 = Vec3::Y;
pub const ORIGINAL_RIGHT: Vec3 = Vec3::X;

/// A rigid-body viewpoint with a perspective projection.
///
/// The basis vectors are always derived from `rotation`; none of them is ever
/// written independently.
#[derive(Debug, Clone)]
pub struct PoseCamera {
    position: Vec3,
    rotation: Quat,
    /// Local-space vector from `position` to the eye (trackball distance).
    offset: Vec3,
    /// Reference "world up" used to keep the roll stable.
    vertical: Vec3,

    // --- Derived from `rotation` ---
    forward: Vec3,
    up: Vec3,
    right: Vec3,

    // --- Projection ---
    h_fov_deg: f32,
    v_fov_deg: f32,
    z_near: f32,
    z_far: f32,
    projection: Mat4,

    // --- Updated by `update()` ---
    view: Mat4,
    view_proj: Mat4,
}

impl PoseCamera {
    pub const DEFAULT_FOV_DEG: f32 = 80.0;
    pub const DEFAULT_Z_NEAR: f32 = 100.0;
    pub const DEFAULT_Z_FAR: f32 = 900_000.0;

    /// Creates a camera at `position` looking along `direction`.
    pub fn new(position: Vec3, direction: Vec3, vertical: Vec3) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            offset: Vec3::ZERO,
            vertical,
            forward: -ORIGINAL_FORWARD,
            up: ORIGINAL_UP,
            right: ORIGINAL_RIGHT,
            h_fov_deg: 0.0,
            v_fov_deg: 0.0,
            z_near: 0.0,
            z_far: 0.0,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
        };

        camera.set_direction(direction, vertical);
        camera.set_projection(
            Self::DEFAULT_FOV_DEG,
            Self::DEFAULT_FOV_DEG,
            Self::DEFAULT_Z_NEAR,
            Self::DEFAULT_Z_FAR,
        );
        camera.update();
        camera
    }

    /// Recomputes the view and view-projection matrices.
    /// Must be called once per frame after any mutation.
    pub fn update(&mut self) {
        if self.vertical.dot(self.up) < 0.0 {
            self.vertical = -self.vertical;
        }

        // The eye's model matrix in world space; the view matrix is its inverse.
        let eye = self.position + self.rotation * self.offset;
        let model = Mat4::from_rotation_translation(self.rotation, eye);
        self.view = model.inverse();
        self.view_proj = self.projection * self.view;
    }

    /// Builds an OpenGL-style symmetric perspective projection.
    ///
    /// Field-of-view angles are in degrees and must lie in (0, 180).
    pub fn set_projection(&mut self, h_fov_deg: f32, v_fov_deg: f32, z_near: f32, z_far: f32) {
        self.h_fov_deg = h_fov_deg;
        self.v_fov_deg = v_fov_deg;
        self.z_near = z_near;
        self.z_far = z_far;

        let fx = 1.0 / (h_fov_deg.to_radians() * 0.5).tan();
        let fy = 1.0 / (v_fov_deg.to_radians() * 0.5).tan();
        let depth = z_far - z_near;

        self.projection = Mat4::from_cols(
            Vec4::new(fx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, fy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -(z_far + z_near) / depth, -1.0),
            Vec4::new(0.0, 0.0, -(2.0 * z_far * z_near) / depth, 0.0),
        );
    }

    /// Points the camera along `direction`, keeping `up` on the same side as `vertical`.
    pub fn set_direction(&mut self, direction: Vec3, vertical: Vec3) {
        let direction = direction.normalize();
        self.rotation = Quat::from_rotation_arc(ORIGINAL_FORWARD, -direction);
        self.update_vectors();

        self.vertical = vertical;
        if self.vertical.dot(self.up) < 0.0 {
            self.rotate(Quat::from_axis_angle(self.forward, std::f32::consts::PI));
        }
    }

    /// Applies `delta` in world space.
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
        self.update_vectors();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.update_vectors();
    }

    pub fn translate(&mut self, t: Vec3) {
        self.position += t;
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.position = p;
    }

    /// Sets the local-space offset between the position and the eye.
    ///
    /// With `x = y = 0` and `z > 0` the camera behaves as a trackball around `position`.
    pub fn set_offset_from_position(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    pub fn offset_from_position(&self) -> Vec3 {
        self.offset
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Viewing direction.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn vertical(&self) -> Vec3 {
        self.vertical
    }

    pub fn h_fov_deg(&self) -> f32 {
        self.h_fov_deg
    }

    pub fn v_fov_deg(&self) -> f32 {
        self.v_fov_deg
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// View-projection in OpenGL clip conventions, as of the last `update()`.
    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    /// View-projection ready for a wgpu uniform.
    pub fn view_proj_wgpu(&self) -> Mat4 {
        OPENGL_TO_WGPU_MATRIX * self.view_proj
    }

    fn update_vectors(&mut self) {
        self.forward = self.rotation * -ORIGINAL_FORWARD;
        self.up = self.rotation * ORIGINAL_UP;
        self.right = self.rotation * ORIGINAL_RIGHT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_orthonormal(cam: &PoseCamera) {
        for v in [cam.forward(), cam.up(), cam.right()] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v:?}");
        }
        assert!(cam.forward().dot(cam.up()).abs() < EPS);
        assert!(cam.forward().dot(cam.right()).abs() < EPS);
        assert!(cam.up().dot(cam.right()).abs() < EPS);
    }

    fn default_camera() -> PoseCamera {
        PoseCamera::new(Vec3::new(0.0, 0.0, 1000.0), Vec3::new(0.0, 0.0, -100.0), Vec3::Y)
    }

    #[test]
    fn looks_down_negative_z_from_default_pose() {
        let cam = default_camera();
        assert!(cam.forward().z < -0.99, "forward = {:?}", cam.forward());
        assert!(cam.up().dot(Vec3::Y) > 0.99);
        assert_orthonormal(&cam);
    }

    #[test]
    fn basis_stays_orthonormal_under_rotations() {
        let mut cam = default_camera();
        let deltas = [
            Quat::from_axis_angle(Vec3::X, 0.3),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 1.7),
            Quat::from_axis_angle(Vec3::Y, -2.9),
            Quat::from_euler(glam::EulerRot::XYZ, 0.1, 0.2, 0.3),
        ];

        for _ in 0..250 {
            for d in deltas {
                cam.rotate(d);
                assert_orthonormal(&cam);
            }
        }
    }

    #[test]
    fn rotate_applies_delta_in_world_space() {
        let mut cam = default_camera();
        // Yaw by 90° about world Y: looking down -Z turns to looking down -X.
        cam.rotate(Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2));
        assert!((cam.forward() - Vec3::NEG_X).length() < EPS);
    }

    #[test]
    fn set_direction_keeps_up_with_vertical() {
        let dirs = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.3, -0.8, 0.2),
            Vec3::new(-5.0, 1.0, 7.0),
        ];
        let verticals = [Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::new(0.2, 0.9, -0.1)];

        for d in dirs {
            for v in verticals {
                let mut cam = default_camera();
                cam.set_direction(d, v);
                assert!(cam.up().dot(v) >= -EPS, "d={d:?} v={v:?} up={:?}", cam.up());
                assert!((cam.forward() - d.normalize()).length() < 1e-3);
                assert_orthonormal(&cam);
            }
        }
    }

    #[test]
    fn update_flips_vertical_to_match_up() {
        let mut cam = default_camera();
        cam.rotate(Quat::from_axis_angle(cam.forward(), std::f32::consts::PI));
        assert!(cam.vertical().dot(cam.up()) < 0.0);
        cam.update();
        assert!(cam.vertical().dot(cam.up()) > 0.0);
    }

    #[test]
    fn projection_round_trips_near_and_far() {
        let mut cam = default_camera();
        for (n, f) in [(100.0, 900_000.0), (0.1, 100.0), (1.0, 2.0), (50.0, 5_000.0)] {
            cam.set_projection(60.0, 45.0, n, f);
            cam.update();

            let p = cam.projection();
            let a = p.z_axis.z;
            let b = p.w_axis.z;
            assert_eq!(p.z_axis.w, -1.0);
            assert_eq!(p.w_axis.w, 0.0);

            let near = b / (a - 1.0);
            let far = b / (a + 1.0);
            assert!((near - n).abs() / n < 5e-3, "near {near} vs {n}");
            assert!((far - f).abs() / f < 5e-3, "far {far} vs {f}");

            let expected = cam.projection() * cam.view();
            assert!(cam.view_proj().abs_diff_eq(expected, 1e-3));
        }
    }

    #[test]
    fn projection_scales_follow_fov() {
        let mut cam = default_camera();
        cam.set_projection(90.0, 90.0, 1.0, 10.0);
        let p = cam.projection();
        assert!((p.x_axis.x - 1.0).abs() < EPS);
        assert!((p.y_axis.y - 1.0).abs() < EPS);
    }

    #[test]
    fn offset_moves_eye_along_local_axis() {
        let mut cam = default_camera();
        cam.set_offset_from_position(Vec3::new(0.0, 0.0, 1500.0));
        cam.update();

        // The eye sits 1500 behind the position, i.e. at z = 2500.
        let eye = cam.view().inverse().transform_point3(Vec3::ZERO);
        assert!((eye - Vec3::new(0.0, 0.0, 2500.0)).length() < 1e-2);

        // The position is still straight ahead of the eye.
        let p = cam.view().transform_point3(cam.position());
        assert!(p.x.abs() < 1e-2 && p.y.abs() < 1e-2 && p.z < 0.0);
    }

    #[test]
    fn wgpu_conversion_maps_near_plane_to_zero_depth() {
        let mut cam = default_camera();
        cam.update();
        let on_near = cam.position() + cam.forward() * cam.z_near();
        let clip = cam.view_proj_wgpu() * on_near.extend(1.0);
        assert!((clip.z / clip.w).abs() < 1e-3);
    }
}
