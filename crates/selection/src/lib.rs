//! Project selection state shared between the UI layer and the frame loop.
//!
//! `SelectionState` is owned by the application root and handed by `&mut` to
//! both the code reacting to "project focused / unfocused" events and the
//! per-frame evaluator that feeds shader uniforms. Time is always supplied by
//! the caller (seconds on the frame driver's clock), which keeps the state
//! machine deterministic.

use settings::Settings;

/// Seconds taken to blend from one project to the next.
pub const DEFAULT_TRANSITION_DURATION: f32 = 0.8;
/// Share of in-flight progress carried into an interrupting transition.
pub const DEFAULT_MOMENTUM_CARRY: f32 = 0.4;
/// Number of projects the background knows how to depict.
pub const DEFAULT_PROJECT_COUNT: u32 = 6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("project index {index} is out of range (expected 0..={count})")]
    OutOfRange { index: u32, count: u32 },
}

/// Snapshot of the selection fed to the shader each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderState {
    /// Selected project, `0` when nothing is selected.
    pub index: u32,
    /// Project being blended away from; equals `index` once settled.
    pub previous_index: u32,
    /// Eased blend factor in `[0, 1]`.
    pub transition_progress: f32,
    /// Seconds since the current project was selected (`0` when none).
    pub project_time: f32,
}

impl ShaderState {
    pub fn is_settled(&self) -> bool {
        self.transition_progress >= 1.0 && self.previous_index == self.index
    }
}

impl Default for ShaderState {
    fn default() -> Self {
        Self {
            index: 0,
            previous_index: 0,
            transition_progress: 1.0,
            project_time: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    project_count: u32,
    duration: f32,
    momentum_carry: f32,
    current: u32,
    previous: u32,
    transition_start: Option<f32>,
    selection_start: Option<f32>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROJECT_COUNT,
            DEFAULT_TRANSITION_DURATION,
            DEFAULT_MOMENTUM_CARRY,
        )
    }
}

impl SelectionState {
    pub fn new(project_count: u32, duration: f32, momentum_carry: f32) -> Self {
        Self {
            project_count,
            duration: duration.max(f32::EPSILON),
            momentum_carry: momentum_carry.clamp(0.0, 1.0),
            current: 0,
            previous: 0,
            transition_start: None,
            selection_start: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.project_count,
            settings.transition.duration.as_secs_f32(),
            settings.transition.momentum_carry,
        )
    }

    pub fn project_count(&self) -> u32 {
        self.project_count
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Focuses project `index` (`0` clears the selection).
    pub fn select(&mut self, index: u32, now: f32) -> Result<(), SelectionError> {
        if index > self.project_count {
            return Err(SelectionError::OutOfRange {
                index,
                count: self.project_count,
            });
        }
        if index == self.current {
            return Ok(());
        }

        let raw = self.raw_progress(now);
        let leaving = self.current;
        // A transition started at this same instant (raw == 0) is still in
        // flight: its outgoing look is what is on screen.
        let in_flight = self.transition_start.is_some() && raw < 1.0;
        if in_flight {
            let carried = raw * self.momentum_carry;
            if raw > 0.5 {
                self.previous = leaving;
            }
            self.transition_start = Some(now - carried * self.duration);
            tracing::debug!(
                from = leaving,
                to = index,
                interrupted_at = raw,
                carried,
                previous = self.previous,
                "interrupting project transition"
            );
        } else {
            self.previous = leaving;
            self.transition_start = Some(now);
            tracing::debug!(from = leaving, to = index, "starting project transition");
        }

        self.current = index;
        self.selection_start = if index > 0 { Some(now) } else { None };
        Ok(())
    }

    pub fn clear(&mut self, now: f32) {
        // Index 0 is always in range.
        let _ = self.select(0, now);
    }

    /// Reports the blend state at `now`, collapsing finished transitions.
    pub fn evaluate(&mut self, now: f32) -> ShaderState {
        let raw = self.raw_progress(now);
        if raw >= 1.0 {
            self.previous = self.current;
        }

        let project_time = match self.selection_start {
            Some(start) if self.current > 0 => (now - start).max(0.0),
            _ => 0.0,
        };

        ShaderState {
            index: self.current,
            previous_index: self.previous,
            transition_progress: smoothstep(raw),
            project_time,
        }
    }

    fn raw_progress(&self, now: f32) -> f32 {
        match self.transition_start {
            Some(start) => ((now - start) / self.duration).clamp(0.0, 1.0),
            None => 1.0,
        }
    }
}

/// Cubic Hermite ease `3p² - 2p³` over `[0, 1]`.
pub fn smoothstep(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    p * p * (3.0 - 2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_settled_with_nothing_selected() {
        let mut state = SelectionState::default();
        let snapshot = state.evaluate(0.0);
        assert_eq!(snapshot, ShaderState::default());
        assert!(snapshot.is_settled());
    }

    #[test]
    fn select_then_evaluate_midway_and_at_end() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();

        let mid = state.evaluate(0.4);
        assert!(mid.transition_progress > 0.0 && mid.transition_progress < 1.0);
        assert_eq!(mid.previous_index, 0);
        assert_eq!(mid.index, 1);

        let end = state.evaluate(0.8);
        assert_eq!(end.transition_progress, 1.0);
        assert_eq!(end.previous_index, 1);
    }

    #[test]
    fn evaluate_is_idempotent_once_settled() {
        let mut state = SelectionState::default();
        state.select(3, 1.0).unwrap();
        let first = state.evaluate(2.0);
        let second = state.evaluate(2.0);
        let later = state.evaluate(5.0);
        for snapshot in [first, second, later] {
            assert_eq!(snapshot.transition_progress, 1.0);
            assert_eq!(snapshot.previous_index, snapshot.index);
        }
        assert_eq!(first, second);
    }

    #[test]
    fn reselection_restarts_from_carried_progress_then_never_goes_backward() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();

        let step = 1.0 / 60.0;
        let mut last = -1.0;
        let mut t = 0.0;
        let mut reselected = false;
        while t < 1.6 {
            if !reselected && t >= 0.2 {
                let before = state.evaluate(t).transition_progress;
                state.select(2, t).unwrap();
                let after = state.evaluate(t).transition_progress;
                // raw progress r restarts at r * carry: a documented drop
                let raw = t / DEFAULT_TRANSITION_DURATION;
                assert!((before - smoothstep(raw)).abs() < 1e-5);
                assert!((after - smoothstep(raw * DEFAULT_MOMENTUM_CARRY)).abs() < 1e-5);
                assert!(after < before);
                last = after;
                reselected = true;
            }
            let snapshot = state.evaluate(t);
            if reselected {
                assert!(
                    snapshot.transition_progress >= last,
                    "progress went backward at t={t}: {} < {last}",
                    snapshot.transition_progress
                );
            }
            last = snapshot.transition_progress;
            t += step;
        }
        assert!(reselected);
        assert_eq!(last, 1.0);
        assert_eq!(state.evaluate(1.6).previous_index, 2);
    }

    #[test]
    fn same_instant_leave_and_enter_keeps_the_outgoing_look() {
        let mut state = SelectionState::default();
        state.select(2, 0.0).unwrap();
        let settled = state.evaluate(1.0);
        assert_eq!(settled.previous_index, 2);

        state.clear(2.0);
        state.select(3, 2.0).unwrap();
        let after = state.evaluate(2.0);
        assert_eq!(after.index, 3);
        assert_eq!(after.previous_index, 2);
        assert_eq!(after.transition_progress, 0.0);

        let done = state.evaluate(3.0);
        assert_eq!(done.previous_index, 3);
        assert_eq!(done.transition_progress, 1.0);
    }

    #[test]
    fn two_selections_in_one_frame_blend_from_the_first_look() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();
        state.evaluate(1.0);

        state.select(4, 1.5).unwrap();
        state.select(5, 1.5).unwrap();
        let snapshot = state.evaluate(1.5);
        assert_eq!(snapshot.index, 5);
        assert_eq!(snapshot.previous_index, 1);
        assert_eq!(snapshot.transition_progress, 0.0);
    }

    #[test]
    fn interruption_carries_momentum() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();
        state.select(2, 0.2).unwrap();
        let snapshot = state.evaluate(0.2);
        // raw progress 0.25 carried at 0.4 -> new raw 0.1
        assert!((snapshot.transition_progress - smoothstep(0.1)).abs() < 1e-5);
        assert!(snapshot.transition_progress > 0.0);
    }

    #[test]
    fn early_interruption_keeps_previous_index() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();
        state.select(2, 0.2).unwrap();
        let snapshot = state.evaluate(0.25);
        assert_eq!(snapshot.previous_index, 0);
        assert_eq!(snapshot.index, 2);
    }

    #[test]
    fn late_interruption_snaps_previous_to_interrupted_target() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();
        state.select(4, 0.6).unwrap();
        let snapshot = state.evaluate(0.61);
        assert_eq!(snapshot.previous_index, 1);
        assert_eq!(snapshot.index, 4);
    }

    #[test]
    fn clear_is_select_zero() {
        let mut state = SelectionState::default();
        state.select(2, 0.0).unwrap();
        state.evaluate(1.0);
        state.clear(2.0);
        let snapshot = state.evaluate(2.4);
        assert_eq!(snapshot.index, 0);
        assert_eq!(snapshot.previous_index, 2);
        assert_eq!(snapshot.project_time, 0.0);
    }

    #[test]
    fn project_time_resets_on_selection() {
        let mut state = SelectionState::default();
        state.select(1, 0.0).unwrap();
        assert!((state.evaluate(3.0).project_time - 3.0).abs() < 1e-6);
        state.clear(3.0);
        assert_eq!(state.evaluate(4.0).project_time, 0.0);
        state.select(5, 4.0).unwrap();
        assert!((state.evaluate(4.5).project_time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reselecting_current_is_a_no_op() {
        let mut state = SelectionState::default();
        state.select(2, 0.0).unwrap();
        state.select(2, 0.4).unwrap();
        let snapshot = state.evaluate(0.8);
        assert_eq!(snapshot.transition_progress, 1.0);
        assert!((snapshot.project_time - 0.8).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut state = SelectionState::default();
        let err = state.select(7, 0.0).unwrap_err();
        assert_eq!(err, SelectionError::OutOfRange { index: 7, count: 6 });
        assert_eq!(state.current(), 0);
    }

    #[test]
    fn honours_settings() {
        let config = Settings::from_toml_str(
            r#"
project_count = 3

[transition]
duration = "2s"
momentum_carry = 0.0
"#,
        )
        .unwrap();
        let mut state = SelectionState::from_settings(&config);
        assert_eq!(state.project_count(), 3);
        state.select(3, 0.0).unwrap();
        let mid = state.evaluate(1.0);
        assert!((mid.transition_progress - 0.5).abs() < 1e-6);
        assert!(state.select(4, 1.0).is_err());
    }

    #[test]
    fn evaluate_before_start_clamps_to_zero() {
        let mut state = SelectionState::default();
        state.select(1, 5.0).unwrap();
        let snapshot = state.evaluate(4.0);
        assert_eq!(snapshot.transition_progress, 0.0);
        assert_eq!(snapshot.project_time, 0.0);
    }
}
