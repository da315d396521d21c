//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod ball;
pub mod bricks;
pub mod bullet;
pub mod collision;
pub mod cursor;
pub mod enemy;
pub mod events;
pub mod geometry;
pub mod paddle;
pub mod scheduler;
pub mod ship;
pub mod spawner;
pub mod state;
pub mod tick;

pub use ball::{Ball, BallSpawner, BallStep};
pub use bricks::{Brick, BrickField, compute_columns, layout_grid};
pub use bullet::Bullet;
pub use collision::{Aabb, CollisionResult};
pub use cursor::{AimCursor, AimInput};
pub use enemy::{Enemy, EnemyKind, Motion};
pub use events::{EventBus, EventKind, GameEvent, Subscription};
pub use geometry::{obstacle_reflect, paddle_reflect, PaddleContact};
pub use paddle::Paddle;
pub use scheduler::{LogCurve, SchedulerConfig, SpawnScheduler};
pub use ship::{PlayerShip, Shot};
pub use spawner::{EnemySpawner, SpawnRequest};
pub use state::{GamePhase, GameState, SharedRng, SharedState, WorldBounds, seeded_rng};
pub use tick::{Feedback, TickInput, World};
