//! Morphing signed-distance solid rendered by sphere tracing.

use glam::{Vec2, Vec3};

use crate::noise::smoothstep;

/// Seconds each shape is held before morphing.
pub const HOLD_SECONDS: f32 = 4.0;
/// Seconds spent morphing into the next shape.
pub const MORPH_SECONDS: f32 = 1.0;
pub const SHAPE_COUNT: usize = 5;
pub const SEGMENT_SECONDS: f32 = HOLD_SECONDS + MORPH_SECONDS;
pub const CYCLE_SECONDS: f32 = SEGMENT_SECONDS * SHAPE_COUNT as f32;

pub const MAX_STEPS: usize = 64;
pub const SURFACE_EPSILON: f32 = 1e-3;
pub const FAR_DISTANCE: f32 = 20.0;

const EYE: Vec3 = Vec3::new(0.0, 0.0, 5.0);
const FOCAL: f32 = 2.5;
const BASE_SIZE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Pyramid,
    Sphere,
    Cube,
    Octahedron,
    Torus,
}

impl Shape {
    pub const CYCLE: [Shape; SHAPE_COUNT] = [
        Shape::Pyramid,
        Shape::Sphere,
        Shape::Cube,
        Shape::Octahedron,
        Shape::Torus,
    ];

    pub fn distance(self, p: Vec3) -> f32 {
        match self {
            Shape::Pyramid => pyramid(p, 1.6, 2.6),
            Shape::Sphere => p.length() - BASE_SIZE,
            Shape::Cube => rounded_box(p, Vec3::splat(1.4), 0.15),
            Shape::Octahedron => octahedron(p, 2.3),
            Shape::Torus => torus(p, 1.5, 0.6),
        }
    }
}

/// Where the morph cycle is at time `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphState {
    pub from: Shape,
    pub to: Shape,
    /// Eased blend from `from` to `to`.
    pub blend: f32,
}

pub fn morph_state(t: f32) -> MorphState {
    let phase = t.max(0.0) % CYCLE_SECONDS;
    let index = (phase / SEGMENT_SECONDS).floor() as usize % SHAPE_COUNT;
    let local = phase - index as f32 * SEGMENT_SECONDS;
    let blend = smoothstep(0.0, 1.0, (local - HOLD_SECONDS) / MORPH_SECONDS);
    MorphState {
        from: Shape::CYCLE[index],
        to: Shape::CYCLE[(index + 1) % SHAPE_COUNT],
        blend,
    }
}

fn rounded_box(p: Vec3, half: Vec3, radius: f32) -> f32 {
    let q = p.abs() - half + Vec3::splat(radius);
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0) - radius
}

fn octahedron(p: Vec3, size: f32) -> f32 {
    let p = p.abs();
    (p.x + p.y + p.z - size) * 0.577_350_26
}

fn torus(p: Vec3, major: f32, minor: f32) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.z).length() - major, p.y);
    q.length() - minor
}

/// Square pyramid with base width `base`, vertically centred on the origin.
fn pyramid(p: Vec3, base: f32, height: f32) -> f32 {
    let p = Vec3::new(p.x, p.y + height * 0.5, p.z) / base;
    let h = height / base;
    let m2 = h * h + 0.25;

    let mut xz = Vec2::new(p.x.abs(), p.z.abs());
    if xz.y > xz.x {
        xz = Vec2::new(xz.y, xz.x);
    }
    xz -= Vec2::splat(0.5);

    let q = Vec3::new(xz.y, h * p.y - 0.5 * xz.x, h * xz.x + 0.5 * p.y);
    let s = (-q.x).max(0.0);
    let t = ((q.y - 0.5 * xz.y) / (m2 + 0.25)).clamp(0.0, 1.0);
    let a = m2 * (q.x + s) * (q.x + s) + q.y * q.y;
    let b = m2 * (q.x + 0.5 * t) * (q.x + 0.5 * t) + (q.y - m2 * t) * (q.y - m2 * t);
    let d2 = if q.y.min(-q.x * m2 - q.y * 0.5) > 0.0 {
        0.0
    } else {
        a.min(b)
    };
    let sign = q.z.max(-p.y).signum();
    base * ((d2 + q.z * q.z) / m2).sqrt() * sign
}

fn rotate(p: Vec3, yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let p = Vec3::new(cy * p.x + sy * p.z, p.y, -sy * p.x + cy * p.z);
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(p.x, cp * p.y - sp * p.z, sp * p.y + cp * p.z)
}

/// Placement of the solid for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidFrame {
    pub morph: MorphState,
    pub scale: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Screen-space centre of the solid (uv units).
    pub center: Vec2,
}

impl SolidFrame {
    pub fn at(t: f32, scale: f32, spin: f32) -> Self {
        let orbit = t * 0.06;
        Self {
            morph: morph_state(t),
            scale: scale.max(0.05),
            yaw: t * 0.15 * spin,
            pitch: 0.35 + 0.1 * (t * 0.2).sin(),
            center: Vec2::new(
                -0.4 + (orbit * 0.4).cos() * 0.15,
                -0.3 + (orbit * 0.3).sin() * 0.1,
            ),
        }
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        let local = rotate(p / self.scale, self.yaw, self.pitch);
        let a = self.morph.from.distance(local);
        let b = self.morph.to.distance(local);
        (a + (b - a) * self.morph.blend) * self.scale
    }

    pub fn normal(&self, p: Vec3) -> Vec3 {
        let e = 1e-3;
        let dx = self.distance(p + Vec3::X * e) - self.distance(p - Vec3::X * e);
        let dy = self.distance(p + Vec3::Y * e) - self.distance(p - Vec3::Y * e);
        let dz = self.distance(p + Vec3::Z * e) - self.distance(p - Vec3::Z * e);
        let n = Vec3::new(dx, dy, dz);
        if n.length_squared() <= 1e-12 {
            Vec3::Z
        } else {
            n.normalize()
        }
    }

    /// Ray through screen point `uv` for the solid's own camera.
    pub fn ray(&self, uv: Vec2) -> (Vec3, Vec3) {
        let offset = uv - self.center;
        (EYE, Vec3::new(offset.x, offset.y, -FOCAL).normalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub steps: usize,
}

/// Sphere-traces the solid, stepping by the SDF value.
pub fn march(frame: &SolidFrame, origin: Vec3, dir: Vec3) -> Option<SolidHit> {
    let mut travelled = 0.0;
    for step in 0..MAX_STEPS {
        let point = origin + dir * travelled;
        let d = frame.distance(point);
        if d < SURFACE_EPSILON {
            return Some(SolidHit {
                point,
                normal: frame.normal(point),
                distance: travelled,
                steps: step + 1,
            });
        }
        travelled += d;
        if travelled > FAR_DISTANCE {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_holds_then_morphs() {
        let held = morph_state(2.0);
        assert_eq!(held.from, Shape::Pyramid);
        assert_eq!(held.to, Shape::Sphere);
        assert_eq!(held.blend, 0.0);

        let mid = morph_state(4.5);
        assert!((mid.blend - 0.5).abs() < 1e-5);

        let next = morph_state(5.0);
        assert_eq!(next.from, Shape::Sphere);
        assert_eq!(next.blend, 0.0);
    }

    #[test]
    fn cycle_wraps_back_to_pyramid() {
        let last = morph_state(22.0);
        assert_eq!(last.from, Shape::Torus);
        assert_eq!(last.to, Shape::Pyramid);
        assert_eq!(morph_state(CYCLE_SECONDS + 1.0).from, Shape::Pyramid);
    }

    #[test]
    fn primitives_are_negative_inside() {
        for shape in Shape::CYCLE {
            let probe = if shape == Shape::Torus {
                Vec3::new(1.5, 0.0, 0.0)
            } else {
                Vec3::ZERO
            };
            assert!(shape.distance(probe) < 0.0, "{shape:?} not negative inside");
            assert!(shape.distance(Vec3::splat(10.0)) > 0.0);
        }
    }

    #[test]
    fn sphere_distance_is_exact() {
        assert!((Shape::Sphere.distance(Vec3::new(5.0, 0.0, 0.0)) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn march_hits_solid_through_its_centre() {
        let frame = SolidFrame::at(1.0, 1.0, 1.0);
        let (origin, dir) = frame.ray(frame.center);
        let hit = march(&frame, origin, dir).expect("centre ray should hit");
        assert!(hit.distance > 0.0 && hit.distance < FAR_DISTANCE);
        assert!(frame.distance(hit.point).abs() < 1e-2);
        assert!(hit.normal.z > 0.0);
    }

    #[test]
    fn march_misses_off_to_the_side() {
        let frame = SolidFrame::at(1.0, 1.0, 1.0);
        let (origin, dir) = frame.ray(frame.center + Vec2::new(3.0, 3.0));
        assert!(march(&frame, origin, dir).is_none());
    }
}
