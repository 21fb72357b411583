//! Visibility gate: pauses rendering while the surface is off screen.

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.area() <= 0.0
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// Tracks whether the surface intersects the (margin-expanded) viewport.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    threshold: f64,
    margin: f64,
    visible: bool,
    forced_hidden: bool,
    last_ratio_visible: bool,
}

impl VisibilityGate {
    /// Starts visible.
    pub fn new(threshold: f32, margin: f32) -> Self {
        Self {
            threshold: f64::from(threshold),
            margin: f64::from(margin),
            visible: true,
            forced_hidden: false,
            last_ratio_visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Fraction of `surface` inside `viewport` grown by the margin.
    pub fn ratio(&self, surface: &Rect, viewport: &Rect) -> f64 {
        if surface.is_empty() {
            return 0.0;
        }
        surface
            .intersection(&viewport.expand(self.margin))
            .map(|overlap| overlap.area() / surface.area())
            .unwrap_or(0.0)
    }

    /// Re-evaluates visibility. Returns the new value only when it flipped.
    pub fn observe(&mut self, surface: &Rect, viewport: &Rect) -> Option<bool> {
        let ratio = self.ratio(surface, viewport);
        self.last_ratio_visible = ratio > 0.0 && ratio >= self.threshold;
        self.settle()
    }

    /// Occlusion or minimisation overrides the geometric test.
    pub fn force_hidden(&mut self, hidden: bool) -> Option<bool> {
        self.forced_hidden = hidden;
        self.settle()
    }

    fn settle(&mut self) -> Option<bool> {
        let visible = self.last_ratio_visible && !self.forced_hidden;
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        tracing::debug!(visible, "surface visibility changed");
        Some(visible)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::clock::FrameDriver;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1920.0, 1080.0);

    #[test]
    fn surface_inside_viewport_is_visible() {
        let mut gate = VisibilityGate::new(0.01, 100.0);
        assert_eq!(gate.observe(&Rect::new(0.0, 0.0, 1920.0, 1080.0), &VIEWPORT), None);
        assert!(gate.is_visible());
    }

    #[test]
    fn margin_keeps_nearby_surfaces_visible() {
        let mut gate = VisibilityGate::new(0.01, 100.0);
        let just_below = Rect::new(0.0, 1130.0, 1920.0, 1080.0);
        assert_eq!(gate.observe(&just_below, &VIEWPORT), None);

        let far_below = Rect::new(0.0, 1300.0, 1920.0, 1080.0);
        assert_eq!(gate.observe(&far_below, &VIEWPORT), Some(false));
        assert_eq!(gate.observe(&far_below, &VIEWPORT), None);
        assert_eq!(gate.observe(&just_below, &VIEWPORT), Some(true));
    }

    #[test]
    fn slivers_below_threshold_are_hidden() {
        let mut gate = VisibilityGate::new(0.01, 0.0);
        // 5 of 1080 rows overlap: ratio below 1%.
        let sliver = Rect::new(0.0, 1075.0, 1920.0, 1080.0);
        assert!(gate.ratio(&sliver, &VIEWPORT) < 0.01);
        assert_eq!(gate.observe(&sliver, &VIEWPORT), Some(false));
    }

    #[test]
    fn forced_hidden_overrides_geometry() {
        let mut gate = VisibilityGate::new(0.01, 100.0);
        assert_eq!(gate.force_hidden(true), Some(false));
        assert_eq!(gate.observe(&VIEWPORT, &VIEWPORT), None);
        assert_eq!(gate.force_hidden(false), Some(true));
    }

    #[test]
    fn hidden_surface_gets_no_frames_until_visible_again() {
        let t0 = Instant::now();
        let mut gate = VisibilityGate::new(0.01, 100.0);
        let mut driver = FrameDriver::new(t0);
        let offscreen = Rect::new(5000.0, 5000.0, 100.0, 100.0);

        let mut rendered = 0;
        for frame in 0..30u64 {
            let now = t0 + Duration::from_millis(frame * 16);
            let surface = if (10..20).contains(&frame) { offscreen } else { VIEWPORT };
            match gate.observe(&surface, &VIEWPORT) {
                Some(false) => driver.pause(now),
                Some(true) => driver.resume(now),
                None => {}
            }
            if driver.tick(now).is_some() {
                assert!(gate.is_visible());
                rendered += 1;
            }
        }
        assert_eq!(rendered, 20);
    }

    #[test]
    fn rect_geometry() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 0.0, 1.0, 1.0)), None);
        assert_eq!(a.expand(2.0), Rect::new(-2.0, -2.0, 14.0, 14.0));
        assert!(Rect::default().is_empty());
    }
}
