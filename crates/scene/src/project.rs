//! Per-project look of the background.

use glam::Vec3;

/// Parameter set a project index maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectParams {
    /// Multiplier on the solid (or lite sphere) size.
    pub solid_scale: f32,
    /// Multiplier on the solid's rotation speed.
    pub spin: f32,
    /// Multiplier on the grain stipple density.
    pub grain_density: f32,
    /// Multiplier on the floor wave amplitude.
    pub wave_amplitude: f32,
    /// Paper colour the grain is printed on.
    pub tint: Vec3,
    /// Colour of dots and letterform traces.
    pub ink: Vec3,
}

const NEUTRAL: ProjectParams = ProjectParams {
    solid_scale: 1.0,
    spin: 1.0,
    grain_density: 1.0,
    wave_amplitude: 1.0,
    tint: Vec3::ONE,
    ink: Vec3::ZERO,
};

const TABLE: [ProjectParams; 7] = [
    NEUTRAL,
    ProjectParams {
        solid_scale: 1.15,
        spin: 0.6,
        grain_density: 1.2,
        wave_amplitude: 0.8,
        tint: Vec3::new(1.0, 0.985, 0.96),
        ink: Vec3::new(0.10, 0.08, 0.06),
    },
    ProjectParams {
        solid_scale: 0.85,
        spin: 1.6,
        grain_density: 0.9,
        wave_amplitude: 1.3,
        tint: Vec3::new(0.96, 0.985, 1.0),
        ink: Vec3::new(0.04, 0.07, 0.14),
    },
    ProjectParams {
        solid_scale: 1.3,
        spin: 0.4,
        grain_density: 1.4,
        wave_amplitude: 0.6,
        tint: Vec3::new(0.97, 1.0, 0.97),
        ink: Vec3::new(0.05, 0.12, 0.07),
    },
    ProjectParams {
        solid_scale: 1.0,
        spin: 2.0,
        grain_density: 0.75,
        wave_amplitude: 1.5,
        tint: Vec3::new(1.0, 0.97, 0.97),
        ink: Vec3::new(0.16, 0.05, 0.05),
    },
    ProjectParams {
        solid_scale: 0.7,
        spin: 1.1,
        grain_density: 1.1,
        wave_amplitude: 1.0,
        tint: Vec3::new(0.98, 0.97, 1.0),
        ink: Vec3::new(0.09, 0.05, 0.14),
    },
    ProjectParams {
        solid_scale: 1.2,
        spin: 0.8,
        grain_density: 1.6,
        wave_amplitude: 0.9,
        tint: Vec3::new(0.95, 0.95, 0.95),
        ink: Vec3::new(0.02, 0.02, 0.02),
    },
];

impl Default for ProjectParams {
    fn default() -> Self {
        NEUTRAL
    }
}

impl ProjectParams {
    /// Number of distinct non-neutral looks.
    pub const COUNT: u32 = (TABLE.len() - 1) as u32;

    /// Looks up `index`; indices past the table wrap onto it, `0` is neutral.
    pub fn for_index(index: u32) -> Self {
        if index == 0 {
            NEUTRAL
        } else {
            TABLE[((index - 1) % Self::COUNT) as usize + 1]
        }
    }

    /// Linear mix from `self` (at 0) to `other` (at 1).
    pub fn mix(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        Self {
            solid_scale: lerp(self.solid_scale, other.solid_scale),
            spin: lerp(self.spin, other.spin),
            grain_density: lerp(self.grain_density, other.grain_density),
            wave_amplitude: lerp(self.wave_amplitude, other.wave_amplitude),
            tint: self.tint.lerp(other.tint, t),
            ink: self.ink.lerp(other.ink, t),
        }
    }

    /// Parameters in effect while blending from `previous` to `current`.
    pub fn blended(previous: u32, current: u32, progress: f32) -> Self {
        Self::for_index(previous).mix(&Self::for_index(current), progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_neutral() {
        assert_eq!(ProjectParams::for_index(0), ProjectParams::default());
    }

    #[test]
    fn every_project_has_a_distinct_look() {
        for a in 1..=ProjectParams::COUNT {
            for b in (a + 1)..=ProjectParams::COUNT {
                assert_ne!(ProjectParams::for_index(a), ProjectParams::for_index(b));
            }
        }
    }

    #[test]
    fn large_indices_wrap() {
        assert_eq!(
            ProjectParams::for_index(ProjectParams::COUNT + 2),
            ProjectParams::for_index(2)
        );
    }

    #[test]
    fn blend_endpoints_match_table() {
        let from = ProjectParams::for_index(1);
        let to = ProjectParams::for_index(4);
        assert_eq!(ProjectParams::blended(1, 4, 0.0), from);
        assert_eq!(ProjectParams::blended(1, 4, 1.0), to);

        let mid = ProjectParams::blended(1, 4, 0.5);
        assert!((mid.spin - (from.spin + to.spin) * 0.5).abs() < 1e-6);
    }
}
