//! Height-field floor: wave surface, ray intersection and lighting.

use glam::{Vec2, Vec3};

use crate::noise::smoothstep;

/// Base amplitude applied to the sum of wave terms.
pub const WAVE_STRENGTH: f32 = 0.75;
/// Fixed number of root refinement steps along the ray.
pub const REFINE_STEPS: usize = 10;
/// Surface hits beyond this distance count as a miss.
pub const MAX_DISTANCE: f32 = 50.0;
/// Rays this close to horizontal never reach the floor.
pub const MIN_VERTICAL: f32 = 1e-4;
/// Rays shallower than this are treated as grazing.
pub const GRAZING_LIMIT: f32 = -0.02;

const NORMAL_EPSILON: f32 = 0.01;

pub const CAMERA_ORIGIN: Vec3 = Vec3::new(0.0, 14.0, 0.5);
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.0, 1.0);
pub const FOCAL_LENGTH: f32 = 1.25;

/// Orthonormal basis of the floor camera.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub origin: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn floor() -> Self {
        let forward = (CAMERA_TARGET - CAMERA_ORIGIN).normalize();
        let right = Vec3::Y.cross(forward).normalize();
        let up = forward.cross(right);
        Self {
            origin: CAMERA_ORIGIN,
            forward,
            right,
            up,
        }
    }

    pub fn ray(&self, uv: Vec2) -> Vec3 {
        (self.right * uv.x + self.up * uv.y + self.forward * FOCAL_LENGTH).normalize()
    }

    /// Projects a screen-space point onto the `y = 0` plane.
    pub fn ground_point(&self, uv: Vec2) -> Vec2 {
        let rd = self.ray(uv);
        if rd.y.abs() <= MIN_VERTICAL {
            return Vec2::new(self.origin.x, self.origin.z);
        }
        let t = (-self.origin.y / rd.y).max(0.0);
        Vec2::new(self.origin.x + rd.x * t, self.origin.z + rd.z * t)
    }
}

/// Four superposed travelling sines; `amplitude` scales the whole field.
pub fn height(xz: Vec2, t: f32, amplitude: f32) -> f32 {
    let strength = WAVE_STRENGTH * amplitude;
    let radial = (xz * Vec2::new(0.9, 1.1)).length();
    let mut h = 0.0;
    h += strength * 0.40 * (1.25 * xz.x + 1.10 * t).sin();
    h += strength * 0.32 * (1.05 * xz.y - 1.35 * t + 1.2).sin();
    h += strength * 0.22 * (0.85 * (xz.x + xz.y) + 0.90 * t).sin();
    h += strength * 0.15 * (1.90 * radial - 1.10 * t).sin();
    h
}

/// Finite-difference surface normal.
pub fn normal(xz: Vec2, t: f32, amplitude: f32) -> Vec3 {
    let e = NORMAL_EPSILON;
    let h = height(xz, t, amplitude);
    let hx = height(xz + Vec2::new(e, 0.0), t, amplitude);
    let hz = height(xz + Vec2::new(0.0, e), t, amplitude);
    let dx = Vec3::new(e, hx - h, 0.0);
    let dz = Vec3::new(0.0, hz - h, e);
    dz.cross(dx).normalize()
}

/// A ray/floor intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorHit {
    pub distance: f32,
    pub point: Vec3,
}

/// Intersects a ray with the wave surface, or `None` for a miss.
pub fn intersect(origin: Vec3, dir: Vec3, t: f32, amplitude: f32) -> Option<FloorHit> {
    if dir.y.abs() <= MIN_VERTICAL || dir.y > GRAZING_LIMIT {
        return None;
    }

    let mut distance = (-origin.y / dir.y).max(0.0);
    for _ in 0..REFINE_STEPS {
        let p = origin + dir * distance;
        let dy = height(Vec2::new(p.x, p.z), t, amplitude) - p.y;
        distance += dy / dir.y;
    }

    if !distance.is_finite() || distance < 0.0 || distance > MAX_DISTANCE {
        return None;
    }

    let mut point = origin + dir * distance;
    point.y = height(Vec2::new(point.x, point.z), t, amplitude);
    Some(FloorHit { distance, point })
}

/// Light intensity multiplier for a lit floor point at `distance`.
pub fn shading(n: Vec3, distance: f32) -> f32 {
    let light = Vec3::new(-0.35, 0.75, -0.25).normalize();
    let diffuse = n.dot(light).clamp(0.0, 1.0);
    let slope = 1.0 - n.y;
    let ridge = smoothstep(0.10, 0.55, slope);
    let fade = (-0.045 * distance).exp();
    (0.35 + 0.65 * diffuse) * (0.70 + 0.80 * ridge) * fade
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_ray_misses() {
        let camera = Camera::floor();
        assert!(intersect(camera.origin, Vec3::X, 0.0, 1.0).is_none());
        assert!(intersect(camera.origin, Vec3::new(1.0, 5e-5, 0.0).normalize(), 3.0, 1.0).is_none());
        assert!(intersect(camera.origin, Vec3::new(1.0, -1e-4, 0.0), 3.0, 1.0).is_none());
    }

    #[test]
    fn upward_ray_misses() {
        assert!(intersect(Vec3::new(0.0, 14.0, 0.0), Vec3::Y, 0.0, 1.0).is_none());
    }

    #[test]
    fn central_ray_hits_near_surface() {
        let camera = Camera::floor();
        let dir = camera.ray(Vec2::ZERO);
        let hit = intersect(camera.origin, dir, 1.7, 1.0).expect("central ray should hit");
        assert!(hit.distance > 0.0 && hit.distance < MAX_DISTANCE);
        let surface = height(Vec2::new(hit.point.x, hit.point.z), 1.7, 1.0);
        let along_ray = camera.origin + dir * hit.distance;
        assert!((along_ray.y - surface).abs() < 0.05);
    }

    #[test]
    fn height_is_bounded() {
        let bound = WAVE_STRENGTH * (0.40 + 0.32 + 0.22 + 0.15);
        for i in 0..100 {
            let xz = Vec2::new(i as f32 * 0.31 - 15.0, i as f32 * -0.17 + 8.0);
            assert!(height(xz, i as f32 * 0.1, 1.0).abs() <= bound + 1e-5);
        }
    }

    #[test]
    fn flat_floor_normal_points_up() {
        let n = normal(Vec2::new(2.0, -1.0), 0.0, 0.0);
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn shading_fades_with_distance() {
        assert!(shading(Vec3::Y, 1.0) > shading(Vec3::Y, 30.0));
    }

    #[test]
    fn ground_point_under_centre() {
        let camera = Camera::floor();
        let ground = camera.ground_point(Vec2::ZERO);
        assert!(ground.x.abs() < 1e-4);
        assert!(ground.y > 0.5 && ground.y < 1.5);
    }
}
