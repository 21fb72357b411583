use glam::{Vec2, Vec4};
use winit::dpi::PhysicalSize;

use crate::visibility::Rect;

/// Exponentially smoothed pointer position in backing-store pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerSmoother {
    target: Vec2,
    current: Vec2,
    rate: f32,
}

impl PointerSmoother {
    /// Both positions start at `position`.
    pub fn new(position: Vec2, rate: f32) -> Self {
        Self {
            target: position,
            current: position,
            rate: rate.max(0.0),
        }
    }

    /// Places the pointer at `position` without smoothing.
    pub fn reset(&mut self, position: Vec2) {
        self.target = position;
        self.current = position;
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Closes `1 - e^(-rate * dt)` of the remaining distance.
    pub fn update(&mut self, delta_time: f32) -> Vec2 {
        let dt = delta_time.max(0.0);
        let factor = 1.0 - (-self.rate * dt).exp();
        self.current += (self.target - self.current) * factor;
        self.current
    }

    /// `(x, y, 1, 0)`: the third component flags an active pointer.
    pub fn as_uniform(&self) -> Vec4 {
        Vec4::new(self.current.x, self.current.y, 1.0, 0.0)
    }
}

/// Converts window pointer coordinates (logical pixels, top-left origin) into
/// backing-store pixels with a bottom-left origin, the space both fragment
/// shaders work in.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerMapping {
    /// Surface rectangle in the same space as the pointer coordinates.
    pub surface: Option<Rect>,
    pub backing: PhysicalSize<u32>,
    pub device_pixel_ratio: f64,
    pub resolution_scale: f64,
}

impl PointerMapping {
    pub fn map(&self, x: f64, y: f64) -> Vec2 {
        let backing_w = f64::from(self.backing.width);
        let backing_h = f64::from(self.backing.height);

        let (mapped_x, mapped_y) = match self.surface.filter(|rect| !rect.is_empty()) {
            Some(rect) => {
                let mapped_x = (x - rect.x) / rect.width * backing_w;
                let mapped_y = (rect.bottom() - y) / rect.height * backing_h;
                (mapped_x, mapped_y)
            }
            None => {
                let factor = self.device_pixel_ratio * self.resolution_scale;
                (x * factor, backing_h - y * factor)
            }
        };
        Vec2::new(mapped_x as f32, mapped_y as f32)
    }

    /// Centre of the backing store, where the pointer rests before any move.
    pub fn centre(&self) -> Vec2 {
        Vec2::new(self.backing.width as f32, self.backing.height as f32) * 0.5
    }
}
