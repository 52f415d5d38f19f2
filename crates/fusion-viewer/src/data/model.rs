//! Procedural sensor housing meshes, in millimetres, in the sensor frame
//! (X right, Y up, looking down -Z).

use crate::data::types::{ColorVertex, DeviceModel};
use glam::Vec3;

const LENS_SEGMENTS: usize = 24;

/// Physical dimensions of one housing.
#[derive(Debug, Clone, Copy)]
struct Housing {
    width: f32,
    height: f32,
    depth: f32,
    baseline: f32,
    lens_radius: f32,
    body: Vec3,
    lens: Vec3,
}

fn housing(model: DeviceModel) -> Housing {
    match model {
        DeviceModel::Zed => Housing {
            width: 175.0,
            height: 30.0,
            depth: 33.0,
            baseline: 120.0,
            lens_radius: 9.0,
            body: Vec3::new(0.22, 0.22, 0.24),
            lens: Vec3::new(0.03, 0.03, 0.06),
        },
        DeviceModel::Zed2 => Housing {
            width: 175.0,
            height: 30.0,
            depth: 33.0,
            baseline: 120.0,
            lens_radius: 10.0,
            body: Vec3::new(0.12, 0.12, 0.13),
            lens: Vec3::new(0.05, 0.05, 0.09),
        },
        DeviceModel::ZedMini => Housing {
            width: 124.5,
            height: 30.5,
            depth: 26.5,
            baseline: 63.0,
            lens_radius: 8.0,
            body: Vec3::new(0.30, 0.30, 0.32),
            lens: Vec3::new(0.03, 0.03, 0.06),
        },
    }
}

/// Builds the housing of `model` as a triangle list.
pub fn housing_triangles(model: DeviceModel) -> Vec<ColorVertex> {
    let s = housing(model);
    let mut out = Vec::with_capacity(36 + 2 * LENS_SEGMENTS * 3);

    let (hx, hy, hz) = (s.width * 0.5, s.height * 0.5, s.depth * 0.5);
    let corner = |x: f32, y: f32, z: f32| Vec3::new(x * hx, y * hy, z * hz);

    // Counter-clockwise when seen from outside.
    let faces = [
        // front (-Z)
        [corner(-1., -1., -1.), corner(-1., 1., -1.), corner(1., 1., -1.), corner(1., -1., -1.)],
        // back (+Z)
        [corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.)],
        // left (-X)
        [corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.), corner(-1., 1., -1.)],
        // right (+X)
        [corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.), corner(1., -1., 1.)],
        // bottom (-Y)
        [corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.)],
        // top (+Y)
        [corner(-1., 1., -1.), corner(-1., 1., 1.), corner(1., 1., 1.), corner(1., 1., -1.)],
    ];
    for [a, b, c, d] in faces {
        push_quad(&mut out, a, b, c, d, s.body);
    }

    // Lenses sit just proud of the front face.
    let z = -hz - 0.5;
    for cx in [-s.baseline * 0.5, s.baseline * 0.5] {
        push_disc(&mut out, Vec3::new(cx, 0.0, z), s.lens_radius, s.lens);
    }

    out
}

fn push_triangle(out: &mut Vec<ColorVertex>, a: Vec3, b: Vec3, c: Vec3, color: Vec3) {
    for p in [a, b, c] {
        out.push(ColorVertex {
            position: p.to_array(),
            color: color.to_array(),
        });
    }
}

fn push_quad(out: &mut Vec<ColorVertex>, a: Vec3, b: Vec3, c: Vec3, d: Vec3, color: Vec3) {
    push_triangle(out, a, b, c, color);
    push_triangle(out, a, c, d, color);
}

/// A disc in the XY plane facing -Z.
fn push_disc(out: &mut Vec<ColorVertex>, center: Vec3, radius: f32, color: Vec3) {
    let step = std::f32::consts::TAU / LENS_SEGMENTS as f32;
    for i in 0..LENS_SEGMENTS {
        let (s0, c0) = (i as f32 * step).sin_cos();
        let (s1, c1) = ((i + 1) as f32 * step).sin_cos();
        let p0 = center + Vec3::new(c0 * radius, s0 * radius, 0.0);
        let p1 = center + Vec3::new(c1 * radius, s1 * radius, 0.0);
        push_triangle(out, center, p1, p0, color);
    }
}
