//! Ray-stepped projectile

use glam::Vec2;

use super::collision::ray_circle;
use super::enemy::Enemy;
use super::state::GameState;

#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    /// Unit direction, fixed at spawn
    pub direction: Vec2,
    pub speed: f32,
    /// Seconds left before expiry
    pub ttl: f32,
    alive: bool,
}

impl Bullet {
    pub fn new(id: u32, pos: Vec2, direction: Vec2, speed: f32, lifetime: f32) -> Self {
        Self {
            id,
            pos,
            direction: direction.normalize_or(Vec2::Y),
            speed,
            ttl: lifetime,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn destroy(&mut self) {
        self.alive = false;
    }

    /// Cast this tick's travel against `enemies`; hit the nearest one or advance
    ///
    /// Returns the id of the enemy hit, if any.
    pub fn fixed_update(&mut self, dt: f32, enemies: &mut [Enemy], state: &GameState) -> Option<u32> {
        if !self.alive {
            return None;
        }
        self.ttl -= dt;
        if self.ttl <= 0.0 {
            self.alive = false;
            return None;
        }

        let step = self.speed * dt;
        let nearest = enemies
            .iter_mut()
            .filter(|e| e.is_alive())
            .filter_map(|e| ray_circle(self.pos, self.direction, step, e.pos, e.radius).map(|t| (t, e)))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((_, enemy)) = nearest {
            let id = enemy.id;
            enemy.hit(state);
            self.alive = false;
            return Some(id);
        }

        self.pos += self.direction * step;
        None
    }
}
