//! Noise primitives shared by the scene layers.
//!
//! These mirror the GLSL helpers in the renderer's fragment programs so the
//! CPU reference and the GPU agree on structure, if not bit-for-bit.

use glam::{Vec2, Vec3};

/// GLSL-style `fract` (`x - floor(x)`), always in `[0, 1)`.
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289(((x * 34.0) + 1.0) * x)
}

/// 2D simplex noise in roughly `[-1, 1]`.
pub fn simplex2(v: Vec2) -> f32 {
    const C: [f32; 4] = [
        0.211_324_87,
        0.366_025_4,
        -0.577_350_26,
        0.024_390_243,
    ];

    let mut i = (v + Vec2::splat(v.dot(Vec2::splat(C[1])))).floor();
    let x0 = v - i + Vec2::splat(i.dot(Vec2::splat(C[0])));
    let i1 = if x0.x > x0.y {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new(0.0, 1.0)
    };
    let x1 = x0 + Vec2::splat(C[0]) - i1;
    let x2 = x0 + Vec2::splat(C[2]);

    i = Vec2::new(mod289(i.x), mod289(i.y));
    let p = [
        permute(permute(i.y) + i.x),
        permute(permute(i.y + i1.y) + i.x + i1.x),
        permute(permute(i.y + 1.0) + i.x + 1.0),
    ];

    let corners = [x0, x1, x2];
    let mut total = 0.0;
    for (corner, hashed) in corners.iter().zip(p) {
        let mut m = (0.5 - corner.dot(*corner)).max(0.0);
        m *= m;
        m *= m;

        let x = 2.0 * fract(hashed * C[3]) - 1.0;
        let h = x.abs() - 0.5;
        let ox = (x + 0.5).floor();
        let a0 = x - ox;
        m *= 1.792_842_9 - 0.853_734_7 * (a0 * a0 + h * h);
        total += m * (a0 * corner.x + h * corner.y);
    }
    130.0 * total
}

fn hash13(p: Vec3) -> f32 {
    let mut q = Vec3::new(fract(p.x * 0.1031), fract(p.y * 0.1031), fract(p.z * 0.1031));
    q += Vec3::splat(q.dot(Vec3::new(q.z, q.y, q.x) + Vec3::splat(31.32)));
    fract((q.x + q.y) * q.z)
}

/// Trilinear value noise in `[0, 1]` with a smooth (C1) interpolant.
pub fn value3(p: Vec3) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let corner = |x: f32, y: f32, z: f32| hash13(i + Vec3::new(x, y, z));
    let x00 = lerp(corner(0.0, 0.0, 0.0), corner(1.0, 0.0, 0.0), u.x);
    let x10 = lerp(corner(0.0, 1.0, 0.0), corner(1.0, 1.0, 0.0), u.x);
    let x01 = lerp(corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), u.x);
    let x11 = lerp(corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), u.x);
    lerp(lerp(x00, x10, u.y), lerp(x01, x11, u.y), u.z)
}

/// Three octaves of [`value3`], normalised back to `[0, 1]`.
pub fn layered3(p: Vec3) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    let mut norm = 0.0;
    for _ in 0..3 {
        value += amplitude * value3(p * frequency);
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.03;
    }
    value / norm
}

/// Screen-space hash used for the stipple grain.
pub fn grain_hash(p: Vec2, k: Vec2, scale: f32) -> f32 {
    fract(p.dot(k).sin() * scale)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// GLSL `smoothstep`; expects `edge0 < edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplex_stays_in_range_and_is_finite() {
        for ix in -20..20 {
            for iy in -20..20 {
                let v = simplex2(Vec2::new(ix as f32 * 0.37, iy as f32 * 0.53));
                assert!(v.is_finite());
                assert!(v.abs() <= 1.05, "simplex out of range: {v}");
            }
        }
    }

    #[test]
    fn value_noise_is_continuous() {
        let base = Vec3::new(1.3, -2.7, 0.4);
        let a = value3(base);
        let b = value3(base + Vec3::splat(1e-4));
        assert!((a - b).abs() < 1e-2);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn layered_noise_normalised() {
        for step in 0..200 {
            let p = Vec3::new(step as f32 * 0.17, step as f32 * -0.11, step as f32 * 0.07);
            let v = layered3(p);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
