//! CPU reference of the procedural background.
//!
//! [`shade`] evaluates one pixel exactly the way the renderer's fragment
//! programs do: a wave floor seen from above carrying a displaced dot grid,
//! printed on grain-stippled paper whose density comes from either a morphing
//! SDF solid (full variant) or a rotating 2D sphere cloud (lite variant).
//! Selection state tints the result and traces the project letterform.
//!
//! Coordinates follow the GPU convention: `frag_coord` is in pixels with the
//! origin at the bottom-left corner and pixel centres on half-integers.

pub mod floor;
pub mod grid;
pub mod noise;
pub mod project;
pub mod solid;

use std::fmt;

use glam::{Vec2, Vec3, Vec4};
use selection::ShaderState;

pub use project::ProjectParams;

use crate::noise::{grain_hash, layered3, simplex2, smoothstep};

/// Which fragment program to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Full,
    Lite,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Lite => "lite",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame inputs, one field per uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneInputs {
    /// Backing size in pixels (`iResolution.xy`).
    pub resolution: Vec2,
    /// Seconds since the driver started (`iTime`).
    pub time: f32,
    /// `(x, y, pressed, 0)` in pixels, bottom-left origin (`iMouse`).
    pub pointer: Vec4,
    pub selection: ShaderState,
}

impl SceneInputs {
    /// Inputs at `time` with the pointer resting at the centre and nothing
    /// selected.
    pub fn new(resolution: Vec2, time: f32) -> Self {
        Self {
            resolution,
            time,
            pointer: Vec4::new(resolution.x * 0.5, resolution.y * 0.5, 0.0, 0.0),
            selection: ShaderState::default(),
        }
    }

    pub fn with_pointer(mut self, x: f32, y: f32) -> Self {
        self.pointer = Vec4::new(x, y, 1.0, 0.0);
        self
    }

    pub fn with_selection(mut self, selection: ShaderState) -> Self {
        self.selection = selection;
        self
    }

    fn to_uv(&self, pixel: Vec2) -> Vec2 {
        let height = self.resolution.y.max(1.0);
        (pixel - 0.5 * self.resolution) / height
    }
}

const SPHERE_RADIUS: f32 = 1.2;
const BASE_GRAY: f32 = 0.96;
const GRAIN_DARKNESS: f32 = 0.28;
const SHIMMER: f32 = 0.01;

/// Colour of one pixel in linear `[0, 1]` RGB.
pub fn shade(frag_coord: Vec2, inputs: &SceneInputs, variant: Variant) -> Vec3 {
    let t = inputs.time;
    let uv = inputs.to_uv(frag_coord);
    let pointer_uv = inputs.to_uv(inputs.pointer.truncate().truncate());
    let selection = &inputs.selection;
    let progress = selection.transition_progress.clamp(0.0, 1.0);
    let params = ProjectParams::blended(selection.previous_index, selection.index, progress);

    let camera = floor::Camera::floor();
    let ink = floor_ink(&camera, uv, pointer_uv, t, &params, selection, variant);

    let density = match variant {
        Variant::Full => solid_density(uv, pointer_uv, t, &params),
        Variant::Lite => sphere_cloud_density(uv, t, &params),
    };

    paper(frag_coord, density * params.grain_density, &params, t).lerp(params.ink, ink)
}

/// Dot and trace coverage on the floor, already lit. Zero on a miss.
fn floor_ink(
    camera: &floor::Camera,
    uv: Vec2,
    pointer_uv: Vec2,
    t: f32,
    params: &ProjectParams,
    selection: &ShaderState,
    variant: Variant,
) -> f32 {
    let dir = camera.ray(uv);
    let Some(hit) = floor::intersect(camera.origin, dir, t, params.wave_amplitude) else {
        return 0.0;
    };

    let xz = Vec2::new(hit.point.x, hit.point.z);
    let pointer_world = camera.ground_point(pointer_uv);
    let mut coverage = grid::dots(xz, pointer_world);

    if variant == Variant::Full {
        let progress = selection.transition_progress.clamp(0.0, 1.0);
        let outgoing = if selection.previous_index != selection.index {
            grid::trace(xz, pointer_world, selection.previous_index, 1.0) * (1.0 - progress)
        } else {
            0.0
        };
        let incoming = grid::trace(
            xz,
            pointer_world,
            selection.index,
            grid::reveal(selection.project_time),
        ) * progress;
        coverage = coverage.max(outgoing).max(incoming);
    }

    let n = floor::normal(xz, t, params.wave_amplitude);
    (coverage * floor::shading(n, hit.distance)).clamp(0.0, 1.0)
}

/// Stipple density over the morphing solid.
fn solid_density(uv: Vec2, pointer_uv: Vec2, t: f32, params: &ProjectParams) -> f32 {
    let frame = solid::SolidFrame::at(t, params.solid_scale, params.spin);
    let (origin, dir) = frame.ray(uv);
    let Some(hit) = solid::march(&frame, origin, dir) else {
        return 0.0;
    };

    let drift = Vec3::new(t * 0.05, t * 0.03, -t * 0.04);
    let cloud = smoothstep(0.3, 0.75, layered3(hit.point * 1.4 + drift));
    let facing = hit.normal.dot(-dir).clamp(0.0, 1.0);
    let fresnel = (1.0 - facing) * (1.0 - facing);
    let repel = 1.0 - smoothstep(0.0, 0.6, (uv - pointer_uv).length());
    (cloud + 0.5 * fresnel + 0.35 * repel).clamp(0.0, 1.0)
}

/// Stipple density over the rotating 2D sphere.
fn sphere_cloud_density(uv: Vec2, t: f32, params: &ProjectParams) -> f32 {
    let orbit = t * 0.06;
    let center = Vec2::new(
        -0.4 + (orbit * 0.4).cos() * 0.15,
        -0.3 + (orbit * 0.3).sin() * 0.1,
    );
    let radius = SPHERE_RADIUS * params.solid_scale.max(0.05);
    let offset = uv - center;
    let dist = offset.length();
    if dist > radius {
        return 0.0;
    }

    let z = (radius * radius - dist * dist).max(0.0).sqrt();
    let normal = Vec3::new(offset.x, offset.y, z).normalize_or_zero();
    let longitude = normal.x.atan2(normal.z) + t * 0.15 * params.spin;
    let latitude = normal.y.clamp(-1.0, 1.0).asin();
    let surface = Vec2::new(longitude, latitude);

    let morph = t * 0.12;
    let frequency = 0.4;
    let first = simplex2(
        surface * frequency
            + Vec2::new(t * 0.05, t * 0.03)
            + Vec2::new(morph.sin(), (morph * 0.7).cos()),
    );
    let second = simplex2(
        surface * (frequency * 1.33)
            + Vec2::new(-t * 0.06, t * 0.04)
            + Vec2::new((morph * 1.2).cos(), (morph * 0.8).sin()),
    ) * 0.3;

    let edge = 1.0 - smoothstep(radius * 0.7, radius, dist);
    smoothstep(-0.65, 1.05, first + second) * edge
}

/// Grain-stippled paper for a given stipple density.
fn paper(frag_coord: Vec2, density: f32, params: &ProjectParams, t: f32) -> Vec3 {
    let density = density.clamp(0.0, 1.0);
    let shimmer_time = t * 0.08;
    let offset = Vec2::new(
        simplex2(frag_coord * 0.01 + Vec2::splat(shimmer_time * 0.05)),
        simplex2(frag_coord * 0.01 + Vec2::splat(100.0 + shimmer_time * 0.04)),
    ) * SHIMMER;
    let p = frag_coord + offset;

    let grain = grain_hash(p, Vec2::new(12.9898, 78.233), 43758.547) * 0.5
        + grain_hash(p * 0.5 + Vec2::splat(50.0), Vec2::new(63.7264, 10.873), 28947.293) * 0.3
        + grain_hash(p * 2.0 + Vec2::splat(100.0), Vec2::new(91.2834, 45.164), 61532.836) * 0.2;

    let threshold = 1.0 - density * 0.7;
    let stipple = smoothstep(threshold, threshold + 0.15, grain);
    params.tint * (BASE_GRAY - stipple * density * GRAIN_DARKNESS)
}

/// Renders a whole frame into tightly packed RGB8 rows, top row first.
pub fn render(width: u32, height: u32, inputs: &SceneInputs, variant: Variant) -> Vec<u8> {
    let inputs = SceneInputs {
        resolution: Vec2::new(width as f32, height as f32),
        ..*inputs
    };
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for row in 0..height {
        let y = (height - 1 - row) as f32 + 0.5;
        for column in 0..width {
            let colour = shade(Vec2::new(column as f32 + 0.5, y), &inputs, variant);
            for channel in colour.to_array() {
                pixels.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(index: u32, project_time: f32) -> ShaderState {
        ShaderState {
            index,
            previous_index: index,
            transition_progress: 1.0,
            project_time,
        }
    }

    #[test]
    fn every_pixel_is_finite_and_in_range() {
        let resolution = Vec2::new(48.0, 27.0);
        for variant in [Variant::Full, Variant::Lite] {
            for (time, pointer) in [
                (0.0, Vec2::new(24.0, 13.5)),
                (7.3, Vec2::new(0.0, 0.0)),
                (123.4, Vec2::new(-500.0, 9000.0)),
            ] {
                let inputs = SceneInputs::new(resolution, time)
                    .with_pointer(pointer.x, pointer.y)
                    .with_selection(settled(3, 0.7));
                for y in 0..27 {
                    for x in 0..48 {
                        let colour = shade(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), &inputs, variant);
                        for channel in colour.to_array() {
                            assert!(channel.is_finite(), "{variant} produced NaN at ({x}, {y})");
                            assert!((0.0..=1.0).contains(&channel));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn shading_is_deterministic() {
        let inputs = SceneInputs::new(Vec2::new(32.0, 18.0), 3.25).with_pointer(10.0, 4.0);
        assert_eq!(
            render(32, 18, &inputs, Variant::Full),
            render(32, 18, &inputs, Variant::Full)
        );
    }

    #[test]
    fn render_emits_packed_rgb_rows() {
        let inputs = SceneInputs::new(Vec2::ZERO, 1.0);
        assert_eq!(render(7, 5, &inputs, Variant::Lite).len(), 7 * 5 * 3);
        assert!(render(0, 5, &inputs, Variant::Lite).is_empty());
    }

    #[test]
    fn empty_paper_is_base_gray_times_tint() {
        let params = ProjectParams::for_index(2);
        let colour = paper(Vec2::new(12.5, 40.5), 0.0, &params, 2.0);
        assert!((colour - params.tint * BASE_GRAY).length() < 1e-6);
    }

    #[test]
    fn dense_paper_darkens_somewhere() {
        let params = ProjectParams::default();
        let darkest = (0..64)
            .map(|i| paper(Vec2::new(i as f32 + 0.5, 3.5), 1.0, &params, 0.0).x)
            .fold(f32::MAX, f32::min);
        assert!(darkest < BASE_GRAY - 0.1);
    }

    #[test]
    fn selecting_a_project_changes_the_frame() {
        let base = SceneInputs::new(Vec2::new(24.0, 16.0), 2.0);
        let neutral = render(24, 16, &base, Variant::Lite);
        let tinted = render(24, 16, &base.with_selection(settled(1, 2.0)), Variant::Lite);
        assert_ne!(neutral, tinted);
    }

    #[test]
    fn pointer_thickens_the_grain_over_the_solid() {
        // The solid sits near uv (-0.25, -0.3) at t = 1.
        let base = SceneInputs::new(Vec2::new(40.0, 24.0), 1.0);
        let over = render(40, 24, &base.with_pointer(14.0, 5.0), Variant::Full);
        let away = render(40, 24, &base.with_pointer(-1000.0, -1000.0), Variant::Full);
        assert_ne!(over, away);
    }

    #[test]
    fn sphere_cloud_is_empty_outside_the_sphere() {
        let params = ProjectParams::default();
        assert_eq!(sphere_cloud_density(Vec2::new(5.0, 5.0), 0.0, &params), 0.0);
    }

    /// Paper under the current density with no floor ink on top.
    fn bare_paper(frag_coord: Vec2, inputs: &SceneInputs, variant: Variant) -> Vec3 {
        let uv = inputs.to_uv(frag_coord);
        let pointer_uv = inputs.to_uv(inputs.pointer.truncate().truncate());
        let s = &inputs.selection;
        let params = ProjectParams::blended(s.previous_index, s.index, s.transition_progress);
        let density = match variant {
            Variant::Full => solid_density(uv, pointer_uv, inputs.time, &params),
            Variant::Lite => sphere_cloud_density(uv, inputs.time, &params),
        };
        paper(frag_coord, density * params.grain_density, &params, inputs.time)
    }

    #[test]
    fn floor_misses_shade_as_bare_paper() {
        let resolution = Vec2::new(48.0, 27.0);
        let camera = floor::Camera::floor();
        let inputs = SceneInputs::new(resolution, 2.5).with_selection(settled(4, 1.0));
        let amplitude = ProjectParams::for_index(4).wave_amplitude;
        // uv.y of 10 lands past the far limit, 30 grazes, 40 points upward.
        for uv_y in [10.0_f32, 30.0, 40.0] {
            let frag_coord = Vec2::new(24.0, 13.5 + uv_y * resolution.y);
            let uv = inputs.to_uv(frag_coord);
            assert!(floor::intersect(camera.origin, camera.ray(uv), 2.5, amplitude).is_none());
            for variant in [Variant::Full, Variant::Lite] {
                assert_eq!(
                    shade(frag_coord, &inputs, variant),
                    bare_paper(frag_coord, &inputs, variant),
                    "{variant} at uv.y {uv_y}"
                );
            }
        }
        assert!(camera.ray(Vec2::new(0.0, 40.0)).y > 0.0);
    }

    #[test]
    fn floor_hits_are_inked() {
        let inputs = SceneInputs::new(Vec2::new(48.0, 27.0), 2.5);
        let inked = (0..48 * 27).any(|i| {
            let frag_coord = Vec2::new((i % 48) as f32 + 0.5, (i / 48) as f32 + 0.5);
            shade(frag_coord, &inputs, Variant::Lite) != bare_paper(frag_coord, &inputs, Variant::Lite)
        });
        assert!(inked);
    }

    #[test]
    fn non_finite_floor_rays_carry_no_ink() {
        let camera = floor::Camera::floor();
        let params = ProjectParams::default();
        let state = settled(2, 1.0);
        for (uv, t) in [
            (Vec2::new(f32::NAN, 0.0), 1.0),
            (Vec2::new(0.0, f32::INFINITY), 1.0),
            (Vec2::ZERO, f32::NAN),
        ] {
            for variant in [Variant::Full, Variant::Lite] {
                let ink = floor_ink(&camera, uv, Vec2::ZERO, t, &params, &state, variant);
                assert_eq!(ink, 0.0, "{variant} at {uv} t={t}");
            }
        }
    }

    #[test]
    fn variant_names() {
        assert_eq!(Variant::Full.to_string(), "full");
        assert_eq!(Variant::Lite.as_str(), "lite");
    }
}
