//! World-space aim cursor the ship turns toward

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use super::events::{EventKind, Subscription};
use super::state::SharedState;
use crate::tuning::CursorTuning;

/// Where the aim target comes from this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimInput {
    /// Pointer already mapped to world space
    Pointer(Vec2),
    /// Right stick, raw [-1, 1] axes
    Stick(Vec2),
}

#[derive(Debug)]
pub struct AimCursor {
    pos: Vec2,
    tuning: CursorTuning,
    visible: Rc<Cell<bool>>,
    _subscriptions: Vec<Subscription>,
}

impl AimCursor {
    pub fn new(state: &SharedState, tuning: &CursorTuning, start: Vec2) -> Self {
        let visible = Rc::new(Cell::new(true));
        let v = Rc::clone(&visible);
        let show = state.events().subscribe(EventKind::GameStart, move |_| v.set(true));
        let v = Rc::clone(&visible);
        let hide = state.events().subscribe(EventKind::GameOver, move |_| v.set(false));
        Self {
            pos: start,
            tuning: tuning.clone(),
            visible,
            _subscriptions: vec![show, hide],
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn visible(&self) -> bool {
        self.visible.get()
    }

    /// Target point before smoothing
    pub fn target(&self, input: AimInput, player: Vec2) -> Vec2 {
        match input {
            AimInput::Pointer(world) => world,
            AimInput::Stick(stick) => {
                let deadzone = self.tuning.stick_deadzone;
                let aim = if stick.length_squared() < deadzone * deadzone {
                    Vec2::ZERO
                } else {
                    stick.normalize_or_zero()
                };
                player + aim * self.tuning.stick_radius
            }
        }
    }

    /// Frame-rate independent exponential approach toward the target
    pub fn update(&mut self, input: AimInput, player: Vec2, dt: f32) {
        let target = self.target(input, player);
        if self.tuning.smooth <= 0.0 {
            self.pos = target;
        } else {
            let t = 1.0 - (-self.tuning.smooth * dt).exp();
            self.pos = self.pos.lerp(target, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameState, WorldBounds};

    fn cursor(smooth: f32) -> (SharedState, AimCursor) {
        let state = GameState::new(3, WorldBounds::default());
        let tuning = CursorTuning {
            smooth,
            ..CursorTuning::default()
        };
        let cursor = AimCursor::new(&state, &tuning, Vec2::ZERO);
        (state, cursor)
    }

    #[test]
    fn test_zero_smoothing_snaps() {
        let (_state, mut c) = cursor(0.0);
        c.update(AimInput::Pointer(Vec2::new(3.0, 2.0)), Vec2::ZERO, 1.0 / 60.0);
        assert_eq!(c.pos(), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn test_smoothing_approaches_target() {
        let (_state, mut c) = cursor(20.0);
        let target = Vec2::new(4.0, 0.0);
        c.update(AimInput::Pointer(target), Vec2::ZERO, 1.0 / 60.0);
        let expected = 4.0 * (1.0 - (-20.0f32 / 60.0).exp());
        assert!((c.pos().x - expected).abs() < 1e-5);
        for _ in 0..120 {
            c.update(AimInput::Pointer(target), Vec2::ZERO, 1.0 / 60.0);
        }
        assert!(c.pos().distance(target) < 1e-3);
    }

    #[test]
    fn test_stick_deadzone_and_radius() {
        let (_state, c) = cursor(0.0);
        let player = Vec2::new(1.0, 1.0);
        assert_eq!(c.target(AimInput::Stick(Vec2::new(0.1, 0.1)), player), player);
        let t = c.target(AimInput::Stick(Vec2::new(0.0, 0.5)), player);
        assert!((t - Vec2::new(1.0, 3.5)).length() < 1e-5);
    }

    #[test]
    fn test_hidden_after_game_over() {
        let (state, c) = cursor(20.0);
        state.start_game();
        state.end_game();
        assert!(!c.visible());
    }
}
