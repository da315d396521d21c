//! Keyboard-driven breakout paddle

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::collision::Aabb;
use super::events::{EventKind, Subscription};
use super::state::{GameState, SharedState};
use crate::tuning::PaddleTuning;

#[derive(Debug, Clone)]
struct PaddleBody {
    pos: Vec2,
    velocity_x: f32,
    visible: bool,
}

/// Horizontal paddle moved at constant speed by discrete left/right input
#[derive(Debug)]
pub struct Paddle {
    body: Rc<RefCell<PaddleBody>>,
    tuning: PaddleTuning,
    state: Weak<GameState>,
    _subscriptions: Vec<Subscription>,
}

impl Paddle {
    pub fn new(state: &SharedState, tuning: &PaddleTuning) -> Self {
        let body = Rc::new(RefCell::new(PaddleBody {
            pos: tuning.position,
            velocity_x: 0.0,
            visible: true,
        }));

        let b = Rc::clone(&body);
        let show = state.events().subscribe(EventKind::GameStart, move |_| {
            b.borrow_mut().visible = true;
        });
        let b = Rc::clone(&body);
        let hide = state.events().subscribe(EventKind::GameOver, move |_| {
            let mut body = b.borrow_mut();
            body.visible = false;
            body.velocity_x = 0.0;
        });

        Self {
            body,
            tuning: tuning.clone(),
            state: Rc::downgrade(state),
            _subscriptions: vec![show, hide],
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.borrow().pos
    }

    pub fn size(&self) -> Vec2 {
        self.tuning.size
    }

    /// Signed horizontal speed of the last step
    pub fn velocity_x(&self) -> f32 {
        self.body.borrow().velocity_x
    }

    pub fn visible(&self) -> bool {
        self.body.borrow().visible
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos(), self.tuning.size)
    }

    /// Move one fixed step; left wins when both keys are held
    ///
    /// Returns the horizontal velocity applied (0 outside play).
    pub fn fixed_update(&self, left: bool, right: bool, dt: f32) -> f32 {
        let Some(state) = self.state.upgrade() else {
            return 0.0;
        };
        let mut body = self.body.borrow_mut();
        if !state.is_playing() {
            body.velocity_x = 0.0;
            return 0.0;
        }

        let dir = if left {
            -1.0
        } else if right {
            1.0
        } else {
            0.0
        };
        body.velocity_x = dir * self.tuning.speed;
        body.pos.x += body.velocity_x * dt;

        // Keep the whole paddle inside the playfield
        let bounds = state.bounds();
        let half = (self.tuning.size.x * 0.5).min(bounds.width() * 0.5);
        body.pos.x = body.pos.x.clamp(bounds.min.x + half, bounds.max.x - half);
        body.velocity_x
    }
}
