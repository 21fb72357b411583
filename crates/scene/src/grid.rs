//! Displaced dot grid and the animated letterform trace drawn over it.

use glam::Vec2;

use crate::noise::smoothstep;

/// Grid density in cells per world unit.
pub const CELLS_PER_UNIT: f32 = 12.0;
/// Dot radius in units of [`BASE_SIZE`].
pub const DOT_SIZE: f32 = 7.0;
/// Roughly one pixel at the typical viewing distance, in cell space.
pub const BASE_SIZE: f32 = 0.011;
/// World-space radius around the pointer inside which dots are pushed.
pub const PUSH_RADIUS: f32 = 0.8;
/// Maximum push distance in world units.
pub const PUSH_STRENGTH: f32 = 0.3;
/// Seconds for a letterform to trace fully after selection.
pub const TRACE_DURATION: f32 = 1.5;

/// Cell-space offset of glyph points (each step spans this many cells).
const GLYPH_STEP: f32 = 3.0;
/// Cell the glyph origin is anchored to.
const GLYPH_ANCHOR: Vec2 = Vec2::new(8.0, 4.0);
pub const GLYPH_POINTS: usize = 6;

/// One polyline per project (index 1..=6), in glyph steps.
const GLYPHS: [[Vec2; GLYPH_POINTS]; 6] = [
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(2.0, 2.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(4.0, 0.0),
    ],
    [
        Vec2::new(4.0, 4.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(0.0, 2.0),
        Vec2::new(4.0, 2.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(0.0, 0.0),
    ],
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 4.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(3.0, 2.0),
        Vec2::new(1.0, 2.0),
        Vec2::new(1.0, 2.0),
    ],
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(4.0, 4.0),
    ],
    [
        Vec2::new(0.0, 4.0),
        Vec2::new(2.0, 0.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(4.0, 4.0),
    ],
    [
        Vec2::new(4.0, 4.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(4.0, 2.0),
        Vec2::new(2.0, 2.0),
    ],
];

/// Moves a dot centre radially away from the pointer with a cubic falloff.
pub fn displace(center: Vec2, pointer_world: Vec2) -> Vec2 {
    let away = center - pointer_world;
    let distance = away.length();
    if distance < PUSH_RADIUS && distance > 0.001 {
        let falloff = 1.0 - distance / PUSH_RADIUS;
        let push = PUSH_STRENGTH * falloff * falloff * falloff;
        center + away / distance * push
    } else {
        center
    }
}

fn coverage(distance: f32, size_factor: f32) -> f32 {
    let inner = DOT_SIZE * BASE_SIZE * size_factor;
    let outer = inner + BASE_SIZE;
    1.0 - smoothstep(inner, outer, distance)
}

/// Dot coverage at world point `xz`, sampling the 3×3 neighbouring cells.
pub fn dots(xz: Vec2, pointer_world: Vec2) -> f32 {
    let cell = (xz * CELLS_PER_UNIT).floor();
    let mut result: f32 = 0.0;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let neighbor = cell + Vec2::new(dx as f32, dy as f32);
            let center = displace((neighbor + 0.5) / CELLS_PER_UNIT, pointer_world);
            let distance = ((xz - center) * CELLS_PER_UNIT).length();
            result = result.max(coverage(distance, 1.0));
        }
    }
    result
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 <= 1e-8 {
        return (p - a).length();
    }
    let h = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - a - ab * h).length()
}

fn glyph_point(glyph: &[Vec2; GLYPH_POINTS], index: usize, pointer_world: Vec2) -> Vec2 {
    let cell = GLYPH_ANCHOR + glyph[index] * GLYPH_STEP;
    displace((cell + 0.5) / CELLS_PER_UNIT, pointer_world)
}

/// Coverage of project `project`'s letterform, revealed up to `reveal` (0-1).
pub fn trace(xz: Vec2, pointer_world: Vec2, project: u32, reveal: f32) -> f32 {
    if project == 0 || project as usize > GLYPHS.len() || reveal <= 0.0 {
        return 0.0;
    }
    let glyph = &GLYPHS[project as usize - 1];
    let segments = (GLYPH_POINTS - 1) as f32;
    let drawn = reveal.clamp(0.0, 1.0) * segments;

    let mut result: f32 = 0.0;
    for i in 0..GLYPH_POINTS - 1 {
        let fraction = (drawn - i as f32).clamp(0.0, 1.0);
        if fraction <= 0.0 {
            break;
        }
        let a = glyph_point(glyph, i, pointer_world);
        let b = glyph_point(glyph, i + 1, pointer_world);
        let end = a + (b - a) * fraction;
        let distance = segment_distance(xz * CELLS_PER_UNIT, a * CELLS_PER_UNIT, end * CELLS_PER_UNIT);
        result = result.max(coverage(distance, 0.25));
    }
    result
}

/// Reveal ramp for the selected project's trace.
pub fn reveal(project_time: f32) -> f32 {
    smoothstep(0.0, TRACE_DURATION, project_time)
}
