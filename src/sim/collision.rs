//! Collision detection for boxes, circles and rays
//!
//! Bricks, the paddle and the walls are axis-aligned boxes; the ball, the
//! ship and enemies are circles; bullets are short rays stepped each tick.

use glam::Vec2;

use super::state::WorldBounds;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Collision point (if hit)
    pub point: Vec2,
    /// Surface normal at collision (pointing toward the moving body)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: size.abs() * 0.5,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }
}

/// Check collision between a circle and a box
///
/// The normal points from the box surface toward the circle centre. A centre
/// already inside the box is pushed out through the nearest face.
pub fn circle_aabb_collision(pos: Vec2, radius: f32, aabb: &Aabb) -> CollisionResult {
    let closest = pos.clamp(aabb.min(), aabb.max());
    let delta = pos - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            point: closest,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the box: leave through the face with least overlap
    let local = pos - aabb.center;
    let overlap = aabb.half_extents - local.abs();
    let (normal, depth) = if overlap.x < overlap.y {
        (Vec2::new(if local.x < 0.0 { -1.0 } else { 1.0 }, 0.0), overlap.x)
    } else {
        (Vec2::new(0.0, if local.y < 0.0 { -1.0 } else { 1.0 }), overlap.y)
    };
    CollisionResult {
        hit: true,
        point: pos + normal * depth,
        normal,
        penetration: depth + radius,
    }
}

/// Check collision with the left, right and top walls of the playfield
///
/// The bottom edge is open; see [`below_floor`].
pub fn ball_wall_collision(pos: Vec2, radius: f32, bounds: &WorldBounds) -> CollisionResult {
    let checks = [
        (pos.x - radius - bounds.min.x, Vec2::X, Vec2::new(bounds.min.x, pos.y)),
        (bounds.max.x - (pos.x + radius), Vec2::NEG_X, Vec2::new(bounds.max.x, pos.y)),
        (bounds.max.y - (pos.y + radius), Vec2::NEG_Y, Vec2::new(pos.x, bounds.max.y)),
    ];

    let mut best = CollisionResult::miss();
    for (gap, normal, point) in checks {
        if gap < 0.0 && -gap > best.penetration {
            best = CollisionResult {
                hit: true,
                point,
                normal,
                penetration: -gap,
            };
        }
    }
    best
}

/// Whether a ball has dropped fully out through the bottom edge
pub fn below_floor(pos: Vec2, radius: f32, bounds: &WorldBounds) -> bool {
    pos.y + radius < bounds.min.y
}

/// Whether two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Cast a ray against a circle
///
/// Returns the distance along `dir` (unit length) to the first contact
/// within `max_dist`. A ray starting inside the circle hits at distance 0.
pub fn ray_circle(origin: Vec2, dir: Vec2, max_dist: f32, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = m.dot(dir);
    if b > 0.0 {
        return None; // Outside and pointing away
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t <= max_dist).then_some(t.max(0.0))
}
