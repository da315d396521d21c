//! Enemy variants and their movement strategies
//!
//! Every variant shares one contract per tick: aim at the player's last
//! published position, turn the facing toward it at a capped rate, then
//! advance in the variant's own way.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{lerp, rotate_towards};
use super::state::GameState;
use crate::consts::DEGENERATE_SQ;
use crate::tuning::EnemyTuning;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Straight pursuit (drawn as a square)
    Chaser,
    /// Spirals in around the player
    Circle,
    /// Zigzags toward the player
    Diamond,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Chaser, EnemyKind::Diamond, EnemyKind::Circle];
}

/// Per-variant movement state
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Chaser,
    /// Polar offset around the player, seeded from the first observed offset
    Circle { orbit: Option<Orbit> },
    Diamond { time_alive: f32 },
}

/// Spiral state relative to the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Radians
    pub angle: f32,
    pub radius: f32,
}

impl Motion {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Chaser => Motion::Chaser,
            EnemyKind::Circle => Motion::Circle { orbit: None },
            EnemyKind::Diamond => Motion::Diamond { time_alive: 0.0 },
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Sprite facing (turn-rate limited)
    pub facing: Vec2,
    /// Straight line toward the player this tick
    pub direction: Vec2,
    pub radius: f32,
    pub motion: Motion,
    alive: bool,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            facing: Vec2::Y,
            direction: Vec2::Y,
            radius,
            motion: Motion::for_kind(kind),
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Remove without scoring (game-over sweep)
    pub fn destroy(&mut self) {
        self.alive = false;
    }

    /// Take a hit: award one point and die
    ///
    /// Returns false if the enemy was already gone, so double hits in one
    /// tick score once.
    pub fn hit(&mut self, state: &GameState) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        state.increment_score();
        log::debug!("enemy {} ({:?}) destroyed at {:?}", self.id, self.kind, self.pos);
        true
    }

    /// One fixed step toward `player`
    pub fn step(&mut self, player: Vec2, dt: f32, tuning: &EnemyTuning) {
        if !self.alive {
            return;
        }
        let to_player = player - self.pos;
        if to_player.length_squared() < DEGENERATE_SQ {
            return;
        }

        self.direction = to_player.normalize();
        let max_turn = tuning.rotation_speed_deg.to_radians() * dt;
        self.facing = rotate_towards(self.facing, self.direction, max_turn);

        match &mut self.motion {
            Motion::Chaser => {
                self.pos += self.facing * tuning.chaser_speed * dt;
            }
            Motion::Circle { orbit } => {
                let c = &tuning.circle;
                let min_radius = c.min_radius.max(f32::EPSILON);
                let o = orbit.get_or_insert_with(|| {
                    // Offset of the enemy as seen from the player
                    let (r, theta) = cartesian_to_polar(-to_player);
                    Orbit {
                        angle: theta,
                        radius: r.max(min_radius),
                    }
                });

                let dist01 = (o.radius / c.reference_distance.max(f32::EPSILON)).clamp(0.0, 1.0);
                let omega = c.angular_speed_deg.to_radians() * lerp(0.4, 1.0, dist01);
                o.angle += omega * dt;
                o.radius = (o.radius - c.inward_speed * dt).max(min_radius);

                self.pos = player + polar_to_cartesian(o.radius, o.angle);

                let desired = player - self.pos;
                if desired.length_squared() >= DEGENERATE_SQ {
                    self.direction = desired.normalize();
                    let face_turn = c.face_turn_speed_deg.to_radians() * dt;
                    self.facing = rotate_towards(self.facing, self.direction, face_turn);
                }
            }
            Motion::Diamond { time_alive } => {
                let d = &tuning.diamond;
                *time_alive += dt;
                let forward = self.direction;
                let side = forward.perp();
                let offset = (*time_alive * std::f32::consts::PI * d.frequency).sin() * d.amplitude;
                self.pos += (forward * d.forward_speed + side * offset) * dt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::WorldBounds;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_chaser_closes_distance() {
        let tuning = EnemyTuning::default();
        let mut e = Enemy::new(1, EnemyKind::Chaser, Vec2::new(0.0, -5.0), 0.35);
        // Already facing the player (+Y)
        let start = e.pos.distance(Vec2::ZERO);
        for _ in 0..30 {
            e.step(Vec2::ZERO, DT, &tuning);
        }
        let expected = start - tuning.chaser_speed * 30.0 * DT;
        assert!((e.pos.distance(Vec2::ZERO) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_facing_turn_is_rate_limited() {
        let tuning = EnemyTuning::default();
        // Player directly behind: needs a 180° turn at 360°/s
        let mut e = Enemy::new(1, EnemyKind::Chaser, Vec2::new(0.0, 5.0), 0.35);
        e.step(Vec2::ZERO, DT, &tuning);
        let turned = e.facing.angle_to(Vec2::Y).abs().to_degrees();
        assert!((turned - 6.0).abs() < 1e-2, "turned {}", turned);
        assert!((e.direction - Vec2::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_enemy_on_top_of_player_holds_still() {
        let tuning = EnemyTuning::default();
        let mut e = Enemy::new(1, EnemyKind::Diamond, Vec2::new(1.0, 1.0), 0.35);
        e.step(Vec2::new(1.0, 1.0), DT, &tuning);
        assert_eq!(e.pos, Vec2::new(1.0, 1.0));
        assert_eq!(e.motion, Motion::Diamond { time_alive: 0.0 });
    }

    #[test]
    fn test_circle_spirals_in_without_reaching_zero() {
        let tuning = EnemyTuning::default();
        let player = Vec2::new(2.0, 1.0);
        let mut e = Enemy::new(1, EnemyKind::Circle, player + Vec2::new(3.0, 0.0), 0.35);

        e.step(player, DT, &tuning);
        let Motion::Circle { orbit: Some(first) } = e.motion.clone() else {
            panic!("orbit not initialized");
        };
        assert!((first.radius - (3.0 - 0.5 * DT)).abs() < 1e-4);
        assert!(first.angle > 0.0);
        assert!((e.pos.distance(player) - first.radius).abs() < 1e-4);

        for _ in 0..(60 * 20) {
            e.step(player, DT, &tuning);
        }
        let Motion::Circle { orbit: Some(last) } = e.motion.clone() else {
            panic!("orbit lost");
        };
        assert!((last.radius - tuning.circle.min_radius).abs() < 1e-5);
        assert!(e.pos.distance(player) > 0.0);
    }

    #[test]
    fn test_circle_orbit_slows_near_center() {
        let tuning = EnemyTuning::default();
        let far = {
            let mut e = Enemy::new(1, EnemyKind::Circle, Vec2::new(10.0, 0.0), 0.35);
            e.step(Vec2::ZERO, DT, &tuning);
            match e.motion {
                Motion::Circle { orbit: Some(o) } => o.angle,
                _ => unreachable!(),
            }
        };
        let near = {
            let mut e = Enemy::new(2, EnemyKind::Circle, Vec2::new(0.5, 0.0), 0.35);
            e.step(Vec2::ZERO, DT, &tuning);
            match e.motion {
                Motion::Circle { orbit: Some(o) } => o.angle,
                _ => unreachable!(),
            }
        };
        assert!(far > near);
    }

    #[test]
    fn test_diamond_weaves_but_faces_player() {
        let tuning = EnemyTuning::default();
        let mut e = Enemy::new(1, EnemyKind::Diamond, Vec2::new(0.0, -8.0), 0.35);
        let mut max_side = 0.0f32;
        for _ in 0..60 {
            e.step(Vec2::ZERO, DT, &tuning);
            max_side = max_side.max(e.pos.x.abs());
            // Facing tracks the straight line, not the weave
            assert!(e.facing.dot(e.direction) > 0.99);
        }
        assert!(max_side > 0.05);
        assert!(e.pos.y > -8.0);
    }

    #[test]
    fn test_hit_scores_once() {
        let state = GameState::new(3, WorldBounds::default());
        state.start_game();
        let mut e = Enemy::new(1, EnemyKind::Chaser, Vec2::ZERO, 0.35);
        assert!(e.hit(&state));
        assert!(!e.hit(&state));
        assert_eq!(state.score(), 1);
        assert!(!e.is_alive());
    }
}
