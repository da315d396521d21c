//! Game balance and tuning values
//!
//! Every section deserializes with defaults, so a tuning file only has to
//! name the values it overrides. Out-of-range values are clamped by
//! [`Tuning::sanitized`] instead of failing: the frame loop must keep running.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::geometry::{DEFAULT_MAX_PADDLE_ANGLE_DEG, DEFAULT_MIN_OBSTACLE_ANGLE_DEG};
use crate::sim::scheduler::{LogCurve, SchedulerConfig};
use crate::sim::state::WorldBounds;

/// Errors from loading a tuning file
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Value that cannot be clamped into something playable
    #[error("Invalid tuning: {0}")]
    Invalid(String),
}

/// Ball physics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallTuning {
    pub starting_speed: f32,
    pub radius: f32,
    /// Largest launch angle off vertical from the paddle (degrees)
    pub max_paddle_angle_deg: f32,
    /// Half-width of the forbidden near-horizontal band (degrees)
    pub min_obstacle_angle_deg: f32,
    pub speed_up_scale: f32,
    pub starting_position: Vec2,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            starting_speed: 7.5,
            radius: 0.15,
            max_paddle_angle_deg: DEFAULT_MAX_PADDLE_ANGLE_DEG,
            min_obstacle_angle_deg: DEFAULT_MIN_OBSTACLE_ANGLE_DEG,
            speed_up_scale: 2.0,
            starting_position: Vec2::new(0.0, -3.0),
        }
    }
}

/// Breakout paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleTuning {
    pub speed: f32,
    pub size: Vec2,
    pub position: Vec2,
}

impl Default for PaddleTuning {
    fn default() -> Self {
        Self {
            speed: 10.0,
            size: Vec2::new(2.0, 0.3),
            position: Vec2::new(0.0, -4.0),
        }
    }
}

/// Player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    pub move_speed: f32,
    pub turn_speed_deg: f32,
    pub fire_cooldown: f32,
    /// Invincibility window after losing a life (seconds)
    pub hit_cooldown: f32,
    pub radius: f32,
    pub starting_position: Vec2,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_speed_deg: 720.0,
            fire_cooldown: 0.2,
            hit_cooldown: 0.5,
            radius: 0.4,
            starting_position: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub speed: f32,
    pub lifetime: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            speed: 10.0,
            lifetime: 3.0,
        }
    }
}

/// Aim cursor smoothing and gamepad mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorTuning {
    /// 0 = snap, higher = smoother
    pub smooth: f32,
    pub stick_radius: f32,
    pub stick_deadzone: f32,
}

impl Default for CursorTuning {
    fn default() -> Self {
        Self {
            smooth: 20.0,
            stick_radius: 2.5,
            stick_deadzone: 0.2,
        }
    }
}

/// Brick grid layout and progression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickTuning {
    pub brick_size: Vec2,
    pub gap: f32,
    pub starting_rows: u32,
    pub max_rows: u32,
    /// Fraction of the world height where the first row sits
    pub y_scale: f32,
    /// Fraction of the world width the grid may use
    pub x_scale: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Default for BrickTuning {
    fn default() -> Self {
        Self {
            brick_size: Vec2::new(1.0, 0.4),
            gap: 0.25,
            starting_rows: 3,
            max_rows: 8,
            y_scale: 0.8,
            x_scale: 0.95,
            saturation: 0.75,
            value: 0.9,
        }
    }
}

/// Shared enemy movement values plus per-variant extras
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub radius: f32,
    pub rotation_speed_deg: f32,
    pub chaser_speed: f32,
    pub circle: CircleTuning,
    pub diamond: DiamondTuning,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            radius: 0.35,
            rotation_speed_deg: 360.0,
            chaser_speed: 5.0,
            circle: CircleTuning::default(),
            diamond: DiamondTuning::default(),
        }
    }
}

/// Spiral-in orbit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleTuning {
    pub angular_speed_deg: f32,
    /// Radius lost per second
    pub inward_speed: f32,
    pub min_radius: f32,
    /// Radius at which the orbit runs at full angular speed
    pub reference_distance: f32,
    pub face_turn_speed_deg: f32,
}

impl Default for CircleTuning {
    fn default() -> Self {
        Self {
            angular_speed_deg: 180.0,
            inward_speed: 0.5,
            min_radius: 0.25,
            reference_distance: 5.0,
            face_turn_speed_deg: 360.0,
        }
    }
}

/// Zigzag approach
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiamondTuning {
    pub forward_speed: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for DiamondTuning {
    fn default() -> Self {
        Self {
            forward_speed: 3.0,
            amplitude: 1.0,
            frequency: 2.0,
        }
    }
}

/// Enemy spawner cadence and placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    pub schedule: SchedulerConfig,
    pub area_size: Vec2,
    pub spawn_on_edges: bool,
    pub edge_inset: f32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            schedule: SchedulerConfig::default(),
            area_size: Vec2::new(12.0, 7.0),
            spawn_on_edges: true,
            edge_inset: 0.25,
        }
    }
}

/// All balance values for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub starting_lives: u32,
    pub world: WorldBounds,
    pub spawner_count: u32,
    pub ball: BallTuning,
    pub paddle: PaddleTuning,
    pub ship: ShipTuning,
    pub bullet: BulletTuning,
    pub cursor: CursorTuning,
    pub bricks: BrickTuning,
    pub enemies: EnemyTuning,
    pub spawner: SpawnerTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            world: WorldBounds::new(Vec2::new(-8.0, -5.0), Vec2::new(8.0, 5.0)),
            spawner_count: 4,
            ball: BallTuning::default(),
            paddle: PaddleTuning::default(),
            ship: ShipTuning::default(),
            bullet: BulletTuning::default(),
            cursor: CursorTuning::default(),
            bricks: BrickTuning::default(),
            enemies: EnemyTuning::default(),
            spawner: SpawnerTuning::default(),
        }
    }
}

/// Clamp `value` up to `min`, logging the correction
fn at_least(name: &str, value: f32, min: f32) -> f32 {
    if value.is_nan() || value < min {
        log::warn!("tuning: {} = {} clamped to {}", name, value, min);
        min
    } else {
        value
    }
}

/// Replace a non-positive size with `fallback`, logging the correction
fn positive_or(name: &str, value: f32, fallback: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        log::warn!("tuning: {} = {} replaced with {}", name, value, fallback);
        fallback
    }
}

fn clamp_unit(name: &str, value: f32) -> f32 {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        log::warn!("tuning: {} = {} clamped to {}", name, value, clamped);
        clamped
    } else {
        value
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning.sanitized())
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for writing a starter tuning file)
    pub fn to_json_string(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values no clamp can rescue
    fn validate(&self) -> Result<(), TuningError> {
        let b = &self.world;
        if !(b.min.is_finite() && b.max.is_finite()) {
            return Err(TuningError::Invalid("world bounds must be finite".into()));
        }
        Ok(())
    }

    /// Apply the defensive clamps: sizes and speeds stay positive,
    /// probabilities stay in [0, 1], row counts stay at least one.
    pub fn sanitized(mut self) -> Self {
        self.starting_lives = self.starting_lives.max(1);
        self.world = self.world.sorted();

        let ball = &mut self.ball;
        ball.starting_speed = at_least("ball.starting_speed", ball.starting_speed, 0.01);
        ball.radius = at_least("ball.radius", ball.radius, 0.01);
        ball.max_paddle_angle_deg =
            at_least("ball.max_paddle_angle_deg", ball.max_paddle_angle_deg, 0.0).min(89.0);
        ball.min_obstacle_angle_deg =
            at_least("ball.min_obstacle_angle_deg", ball.min_obstacle_angle_deg, 0.0).min(89.0);
        ball.speed_up_scale = at_least("ball.speed_up_scale", ball.speed_up_scale, 0.01);

        let paddle = &mut self.paddle;
        paddle.speed = at_least("paddle.speed", paddle.speed, 0.0);
        paddle.size.x = positive_or("paddle.size.x", paddle.size.x, 1.0);
        paddle.size.y = at_least("paddle.size.y", paddle.size.y, 0.01);

        let ship = &mut self.ship;
        ship.move_speed = at_least("ship.move_speed", ship.move_speed, 0.0);
        ship.turn_speed_deg = at_least("ship.turn_speed_deg", ship.turn_speed_deg, 0.0);
        ship.fire_cooldown = at_least("ship.fire_cooldown", ship.fire_cooldown, 0.0);
        ship.hit_cooldown = at_least("ship.hit_cooldown", ship.hit_cooldown, 0.0);
        ship.radius = at_least("ship.radius", ship.radius, 0.01);

        self.bullet.speed = at_least("bullet.speed", self.bullet.speed, 0.01);
        self.bullet.lifetime = at_least("bullet.lifetime", self.bullet.lifetime, 0.0);

        self.cursor.stick_deadzone = clamp_unit("cursor.stick_deadzone", self.cursor.stick_deadzone);

        let bricks = &mut self.bricks;
        bricks.brick_size.x = positive_or("bricks.brick_size.x", bricks.brick_size.x, 1.0);
        bricks.brick_size.y = positive_or("bricks.brick_size.y", bricks.brick_size.y, 1.0);
        bricks.gap = at_least("bricks.gap", bricks.gap, 0.0);
        bricks.starting_rows = bricks.starting_rows.max(1);
        bricks.max_rows = bricks.max_rows.max(bricks.starting_rows);
        bricks.y_scale = clamp_unit("bricks.y_scale", bricks.y_scale);
        bricks.x_scale = clamp_unit("bricks.x_scale", bricks.x_scale);
        bricks.saturation = clamp_unit("bricks.saturation", bricks.saturation);
        bricks.value = clamp_unit("bricks.value", bricks.value);

        let enemies = &mut self.enemies;
        enemies.radius = at_least("enemies.radius", enemies.radius, 0.01);
        enemies.circle.min_radius = at_least("enemies.circle.min_radius", enemies.circle.min_radius, 0.01);
        enemies.circle.reference_distance = at_least(
            "enemies.circle.reference_distance",
            enemies.circle.reference_distance,
            0.01,
        );

        self.spawner.schedule = self.spawner.schedule.sanitized();
        self.spawner.edge_inset = at_least("spawner.edge_inset", self.spawner.edge_inset, 0.0);
        self
    }
}

impl SchedulerConfig {
    /// Clamp probabilities and order the interval bounds
    pub fn sanitized(mut self) -> Self {
        self.trigger_chance = clamp_unit("spawner.trigger_chance", self.trigger_chance);
        self.min_interval = at_least("spawner.min_interval", self.min_interval, 0.01);
        if self.max_interval < self.min_interval {
            log::warn!(
                "tuning: spawner.max_interval {} below min {}, swapping",
                self.max_interval,
                self.min_interval
            );
            std::mem::swap(&mut self.min_interval, &mut self.max_interval);
            self.min_interval = self.min_interval.max(0.01);
        }
        self.max_burst = self.max_burst.max(1);
        self.interval = LogCurve {
            log_base: at_least("spawner.interval.log_base", self.interval.log_base, 1.0001),
            ..self.interval
        };
        self.burst_chance = LogCurve {
            log_base: at_least("spawner.burst_chance.log_base", self.burst_chance.log_base, 1.0001),
            ..self.burst_chance
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "starting_lives": 5, "ship": { "fire_cooldown": 0.1 } }"#)
            .expect("valid tuning");
        assert_eq!(tuning.starting_lives, 5);
        assert!((tuning.ship.fire_cooldown - 0.1).abs() < 1e-6);
        assert!((tuning.ship.move_speed - 5.0).abs() < 1e-6);
        assert_eq!(tuning.bricks.starting_rows, 3);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Tuning::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Tuning::load("/definitely/not/here/tuning.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
    }

    #[test]
    fn test_sanitized_clamps_degenerate_sizes() {
        let mut tuning = Tuning::default();
        tuning.bricks.brick_size.x = 0.0;
        tuning.paddle.size.x = -2.0;
        tuning.bricks.starting_rows = 0;
        tuning.spawner.schedule.trigger_chance = 4.0;
        let tuning = tuning.sanitized();
        assert!((tuning.bricks.brick_size.x - 1.0).abs() < 1e-6);
        assert!((tuning.paddle.size.x - 1.0).abs() < 1e-6);
        assert_eq!(tuning.bricks.starting_rows, 1);
        assert!((tuning.spawner.schedule.trigger_chance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inverted_interval_bounds_are_swapped() {
        let mut config = SchedulerConfig::default();
        config.min_interval = 8.0;
        config.max_interval = 2.0;
        let config = config.sanitized();
        assert!(config.min_interval <= config.max_interval);
        assert!((config.min_interval - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_through_json() {
        let json = Tuning::default().to_json_string().expect("serializes");
        let back = Tuning::from_json_str(&json).expect("parses");
        assert!((back.ball.starting_speed - 7.5).abs() < 1e-6);
    }
}
