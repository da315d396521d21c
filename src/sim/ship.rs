//! Twin-stick player ship: strafing movement, turn-limited aim, cooldown fire
//! and a short invincibility window after losing a life.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::enemy::Enemy;
use super::events::{EventKind, Subscription};
use super::geometry::rotate_towards;
use super::state::{GameState, SharedState};
use crate::consts::DEGENERATE_SQ;
use crate::tuning::ShipTuning;

/// Slack for timers accumulated from fixed-size float steps
const TIMER_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
struct ShipBody {
    pos: Vec2,
    /// Unit facing, also the firing direction
    facing: Vec2,
    /// Input movement, length ≤ 1
    movement: Vec2,
    active: bool,
    fire_timer: f32,
    invincible: bool,
    hit_timer: f32,
}

impl ShipBody {
    fn spawned(tuning: &ShipTuning) -> Self {
        Self {
            pos: tuning.starting_position,
            facing: Vec2::Y,
            movement: Vec2::ZERO,
            active: true,
            fire_timer: tuning.fire_cooldown,
            invincible: false,
            hit_timer: 0.0,
        }
    }
}

/// A bullet request produced by a successful trigger pull
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub origin: Vec2,
    pub direction: Vec2,
}

/// Outcome of touching an enemy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactOutcome {
    pub enemy_destroyed: bool,
    /// Also the hit-flash cue; stays set when the hit ended the run
    pub life_lost: bool,
}

#[derive(Debug)]
pub struct PlayerShip {
    body: Rc<RefCell<ShipBody>>,
    tuning: ShipTuning,
    state: Weak<GameState>,
    _subscriptions: Vec<Subscription>,
}

impl PlayerShip {
    pub fn new(state: &SharedState, tuning: &ShipTuning) -> Self {
        let body = Rc::new(RefCell::new(ShipBody::spawned(tuning)));

        let b = Rc::clone(&body);
        let spawn = ShipBody::spawned(tuning);
        let on_over = state.events().subscribe(EventKind::GameOver, move |_| {
            *b.borrow_mut() = ShipBody {
                active: false,
                ..spawn.clone()
            };
        });
        let b = Rc::clone(&body);
        let on_start = state.events().subscribe(EventKind::GameStart, move |_| {
            b.borrow_mut().active = true;
        });

        state.set_player_position(tuning.starting_position);
        Self {
            body,
            tuning: tuning.clone(),
            state: Rc::downgrade(state),
            _subscriptions: vec![on_over, on_start],
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.borrow().pos
    }

    pub fn facing(&self) -> Vec2 {
        self.body.borrow().facing
    }

    pub fn movement(&self) -> Vec2 {
        self.body.borrow().movement
    }

    pub fn radius(&self) -> f32 {
        self.tuning.radius
    }

    pub fn is_active(&self) -> bool {
        self.body.borrow().active
    }

    pub fn is_invincible(&self) -> bool {
        self.body.borrow().invincible
    }

    /// Per-frame phase: sample input, count down timers, maybe fire
    pub fn update(&self, movement: Vec2, fire_held: bool, dt: f32) -> Option<Shot> {
        let Some(state) = self.state.upgrade() else {
            return None;
        };
        let (pos, shot) = {
            let mut b = self.body.borrow_mut();
            if !b.active {
                return None;
            }
            let playing = state.is_playing();
            b.movement = if playing {
                movement.clamp_length_max(1.0)
            } else {
                Vec2::ZERO
            };

            let mut shot = None;
            if playing && fire_held && b.fire_timer + TIMER_EPSILON >= self.tuning.fire_cooldown {
                shot = Some(Shot {
                    origin: b.pos,
                    direction: b.facing,
                });
                b.fire_timer = 0.0;
            }
            b.fire_timer += dt;

            if b.hit_timer + TIMER_EPSILON >= self.tuning.hit_cooldown {
                b.hit_timer = 0.0;
                b.invincible = false;
            }
            if b.invincible {
                b.hit_timer += dt;
            }
            (b.pos, shot)
        };

        state.set_player_position(pos);
        shot
    }

    /// Physics phase: turn toward the cursor, then move
    pub fn fixed_update(&self, cursor: Vec2, dt: f32) {
        let playing = self.state.upgrade().is_some_and(|s| s.is_playing());
        let mut b = self.body.borrow_mut();
        if !b.active || !playing {
            return;
        }

        let to_cursor = cursor - b.pos;
        // Cursor on top of the ship keeps the current facing
        if to_cursor.length_squared() >= DEGENERATE_SQ {
            let max_turn = self.tuning.turn_speed_deg.to_radians() * dt;
            b.facing = rotate_towards(b.facing, to_cursor, max_turn);
        }

        let velocity = b.movement * self.tuning.move_speed;
        b.pos += velocity * dt;
    }

    /// Collision with an enemy
    ///
    /// The enemy is always hit; a life is only lost outside the
    /// invincibility window.
    pub fn on_enemy_contact(&self, enemy: &mut Enemy) -> ContactOutcome {
        let Some(state) = self.state.upgrade() else {
            return ContactOutcome::default();
        };
        if !self.is_active() {
            return ContactOutcome::default();
        }

        let enemy_destroyed = enemy.hit(&state);
        let life_lost = {
            let mut b = self.body.borrow_mut();
            if b.invincible {
                false
            } else {
                b.invincible = true;
                b.hit_timer = 0.0;
                true
            }
        };
        if life_lost {
            log::debug!("ship hit by enemy {}", enemy.id);
            state.decrement_lives();
        }
        ContactOutcome {
            enemy_destroyed,
            life_lost,
        }
    }
}
