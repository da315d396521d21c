//! Reflection and steering math
//!
//! Angles are measured counter-clockwise from +X in degrees at the API
//! surface (tuning values are authored in degrees), radians internally.

use glam::Vec2;

use crate::consts::DEGENERATE_SQ;
use crate::normalize_angle;

/// Default half-width of the forbidden near-horizontal band
pub const DEFAULT_MIN_OBSTACLE_ANGLE_DEG: f32 = 30.0;
/// Default largest paddle launch angle off vertical
pub const DEFAULT_MAX_PADDLE_ANGLE_DEG: f32 = 60.0;

/// Standard mirror reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    v - 2.0 * v.dot(n) * n
}

/// Heading of `v` in degrees, (-180, 180]
#[inline]
pub fn heading_deg(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Unit vector for a heading in degrees
#[inline]
pub fn from_heading_deg(deg: f32) -> Vec2 {
    let rad = deg.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Reflect `v` about `n`, then push the result out of the near-horizontal bands
///
/// Headings inside (-θ, θ) snap to ±θ and headings inside (180-θ, 180] or
/// [-180, -180+θ) snap to ±(180-θ), keeping the vertical sign. An exact 0°
/// goes up. A degenerate reflection returns `v` unchanged.
pub fn obstacle_reflect(v: Vec2, n: Vec2, min_angle_deg: f32) -> Vec2 {
    let reflection = reflect(v, n);
    if reflection.length_squared() < DEGENERATE_SQ {
        return v;
    }

    let min_angle = min_angle_deg.clamp(0.0, 89.0);
    let mut angle = heading_deg(reflection);

    if angle > -min_angle && angle < min_angle {
        let sign = if angle == 0.0 { 1.0 } else { angle.signum() };
        angle = sign * min_angle;
    } else if angle > 180.0 - min_angle || angle < -180.0 + min_angle {
        angle = angle.signum() * (180.0 - min_angle);
    }

    from_heading_deg(angle)
}

/// A ball/paddle contact, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleContact {
    pub point: Vec2,
    /// Surface normal pointing from the paddle toward the ball
    pub normal: Vec2,
    pub paddle_center_x: f32,
    pub paddle_half_width: f32,
}

impl PaddleContact {
    /// Underside and side hits bounce like any obstacle
    pub fn is_top_face(&self) -> bool {
        self.normal.y > 0.0 && self.normal.x.abs() <= 0.5
    }

    /// Horizontal contact offset across the paddle, in [-1, 1]
    pub fn offset(&self) -> f32 {
        let half_width = if self.paddle_half_width > 0.0 {
            self.paddle_half_width
        } else {
            1.0
        };
        ((self.point.x - self.paddle_center_x) / half_width).clamp(-1.0, 1.0)
    }
}

/// Launch direction after a paddle contact
///
/// Top-face hits map the contact offset linearly to a heading `offset·θmax`
/// off straight up; every other face falls back to [`obstacle_reflect`].
pub fn paddle_reflect(
    direction: Vec2,
    contact: &PaddleContact,
    max_angle_deg: f32,
    min_obstacle_angle_deg: f32,
) -> Vec2 {
    if !contact.is_top_face() {
        return obstacle_reflect(direction, contact.normal, min_obstacle_angle_deg);
    }
    let angle = (contact.offset() * max_angle_deg).to_radians();
    Vec2::new(angle.sin(), angle.cos())
}

/// Signed angle off straight up, degrees (positive leans right)
#[inline]
pub fn angle_from_vertical_deg(v: Vec2) -> f32 {
    v.x.atan2(v.y).to_degrees()
}

/// Turn `current` toward `target` by at most `max_radians`
///
/// Both inputs are treated as directions. A degenerate target keeps the
/// current heading; a degenerate current snaps straight to the target.
pub fn rotate_towards(current: Vec2, target: Vec2, max_radians: f32) -> Vec2 {
    if target.length_squared() < DEGENERATE_SQ {
        return current;
    }
    let target = target.normalize();
    if current.length_squared() < DEGENERATE_SQ {
        return target;
    }

    let from = current.y.atan2(current.x);
    let to = target.y.atan2(target.x);
    let delta = normalize_angle(to - from);
    let step = max_radians.max(0.0);
    if delta.abs() <= step {
        return target;
    }
    let heading = from + step * delta.signum();
    Vec2::new(heading.cos(), heading.sin())
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// HSV (all components in [0, 1]) to linear RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}
