//! Frame loop: one fast update per rendered frame, then fixed physics steps
//!
//! `World` owns every component of one game and wires them to a single
//! shared [`GameState`]. Nothing here blocks; every event raised during a
//! step has been handled by the time the step returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;

use super::ball::{Ball, BallSpawner};
use super::bricks::{Brick, BrickField};
use super::bullet::Bullet;
use super::collision::circles_overlap;
use super::cursor::{AimCursor, AimInput};
use super::enemy::Enemy;
use super::events::{EventKind, Subscription};
use super::paddle::Paddle;
use super::ship::PlayerShip;
use super::spawner::EnemySpawner;
use super::state::{GamePhase, GameState, SharedRng, SharedState, WorldBounds, seeded_rng};
use crate::Tuning;
use crate::consts::*;

/// Input for one frame (already mapped from devices)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Paddle left (wins over right)
    pub left: bool,
    /// Paddle right
    pub right: bool,
    /// Ship movement, clamped to length 1
    pub movement: Vec2,
    /// Aim source; `None` leaves the cursor where it is
    pub aim: Option<AimInput>,
    /// Fire button held
    pub fire_held: bool,
    /// Start a run if one is not in progress
    pub start: bool,
}

/// Fire-and-forget cues for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    /// Ship took damage
    HitFlash,
    /// Paddle horizontal velocity changed
    PaddleVelocity(f32),
    BrickBroken,
    Shot,
    EnemyDestroyed,
    /// Run ended
    PlayerExploded,
    BallLost,
}

type FeedbackQueue = Rc<RefCell<Vec<Feedback>>>;

pub struct World {
    tuning: Tuning,
    state: SharedState,
    rng: SharedRng,
    bricks: BrickField,
    balls: BallSpawner,
    paddle: Paddle,
    ship: PlayerShip,
    cursor: AimCursor,
    spawners: Vec<EnemySpawner>,
    enemies: Vec<Enemy>,
    bullets: Vec<Bullet>,
    next_entity_id: u32,
    accumulator: f32,
    time_ticks: u64,
    last_paddle_velocity: f32,
    feedback: FeedbackQueue,
    /// Set by `GameOver`, cleared once enemies and bullets are swept
    run_ended: Rc<Cell<bool>>,
    _subscriptions: Vec<Subscription>,
}

impl World {
    /// Build a world on the start screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        let state = GameState::new(tuning.starting_lives, tuning.world);
        let rng = seeded_rng(seed);

        // Subscription order matters: the grid is rebuilt before balls respawn
        let bricks = BrickField::new(&state, &tuning.bricks);
        let balls = BallSpawner::new(&state, &rng, &tuning.ball);
        let paddle = Paddle::new(&state, &tuning.paddle);
        let ship = PlayerShip::new(&state, &tuning.ship);
        let cursor = AimCursor::new(&state, &tuning.cursor, tuning.ship.starting_position + Vec2::Y);
        let center = state.bounds().center();
        let spawners = (0..tuning.spawner_count)
            .map(|_| EnemySpawner::new(&state, &rng, &tuning.spawner, center))
            .collect();

        let feedback: FeedbackQueue = Rc::new(RefCell::new(Vec::new()));
        let run_ended = Rc::new(Cell::new(false));
        let f = Rc::clone(&feedback);
        let ended = Rc::clone(&run_ended);
        let exploded = state.events().subscribe(EventKind::GameOver, move |_| {
            f.borrow_mut().push(Feedback::PlayerExploded);
            ended.set(true);
        });

        log::info!(
            "World created (seed {}, {} enemy spawners)",
            seed,
            tuning.spawner_count
        );

        Self {
            tuning,
            state,
            rng,
            bricks,
            balls,
            paddle,
            ship,
            cursor,
            spawners,
            enemies: Vec::new(),
            bullets: Vec::new(),
            next_entity_id: 0,
            accumulator: 0.0,
            time_ticks: 0,
            last_paddle_velocity: 0.0,
            feedback,
            run_ended,
            _subscriptions: vec![exploded],
        }
    }

    // === Accessors ===

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn ship(&self) -> &PlayerShip {
        &self.ship
    }

    pub fn cursor(&self) -> &AimCursor {
        &self.cursor
    }

    pub fn balls(&self) -> Vec<Rc<Ball>> {
        self.balls.snapshot()
    }

    pub fn bricks(&self) -> Vec<Brick> {
        self.bricks.bricks()
    }

    pub fn brick_field(&self) -> &BrickField {
        &self.bricks
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn spawners(&self) -> &[EnemySpawner] {
        &self.spawners
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Take every cue raised since the last call
    pub fn drain_feedback(&self) -> Vec<Feedback> {
        std::mem::take(&mut *self.feedback.borrow_mut())
    }

    fn emit(&self, cue: Feedback) {
        self.feedback.borrow_mut().push(cue);
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    // === Lifecycle passthroughs ===

    pub fn start_game(&mut self) {
        self.sweep_ended_run();
        self.accumulator = 0.0;
        self.state.start_game();
    }

    pub fn show_start_screen(&self) {
        self.state.show_start_screen();
    }

    pub fn set_world_bounds(&self, bounds: WorldBounds) {
        self.state.set_world_bounds(bounds);
    }

    /// Place an enemy directly (scripted waves, tests)
    pub fn spawn_enemy(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
    }

    // === Frame loop ===

    /// Run one rendered frame: the fast phase once, then as many fixed
    /// steps as the accumulator allows (capped at `MAX_SUBSTEPS`)
    pub fn frame(&mut self, input: &TickInput, frame_dt: f32) {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };

        self.sweep_ended_run();
        if input.start && !self.state.is_playing() {
            self.start_game();
        }

        self.update(input, dt);

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.fixed_update(input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    /// Fast phase: cursor, ship timers and trigger, enemy spawning
    pub fn update(&mut self, input: &TickInput, dt: f32) {
        if let Some(aim) = input.aim {
            self.cursor.update(aim, self.ship.pos(), dt);
        }

        if let Some(shot) = self.ship.update(input.movement, input.fire_held, dt) {
            let id = self.next_id();
            let b = &self.tuning.bullet;
            self.bullets
                .push(Bullet::new(id, shot.origin, shot.direction, b.speed, b.lifetime));
            self.emit(Feedback::Shot);
        }

        let requests: Vec<_> = self.spawners.iter().flat_map(|s| s.update(dt)).collect();
        for request in requests {
            let id = self.next_id();
            log::debug!("spawn {:?} #{} at {:?}", request.kind, id, request.pos);
            self.enemies
                .push(Enemy::new(id, request.kind, request.pos, self.tuning.enemies.radius));
        }
    }

    /// One physics step
    pub fn fixed_update(&mut self, input: &TickInput, dt: f32) {
        self.time_ticks += 1;
        self.sweep_ended_run();

        let velocity = self.paddle.fixed_update(input.left, input.right, dt);
        if velocity != self.last_paddle_velocity {
            self.last_paddle_velocity = velocity;
            self.emit(Feedback::PaddleVelocity(velocity));
        }

        self.step_balls(dt);
        // Losing the last ball ends the run; nothing else may score this step
        if !self.state.is_playing() {
            self.sweep_ended_run();
            return;
        }

        self.ship.fixed_update(self.cursor.pos(), dt);

        let player = self.state.player_position();
        for enemy in &mut self.enemies {
            enemy.step(player, dt, &self.tuning.enemies);
        }

        for bullet in &mut self.bullets {
            if bullet.fixed_update(dt, &mut self.enemies, &self.state).is_some() {
                self.feedback.borrow_mut().push(Feedback::EnemyDestroyed);
            }
        }

        self.resolve_ship_contacts();

        self.enemies.retain(Enemy::is_alive);
        self.bullets.retain(Bullet::is_alive);
        self.sweep_ended_run();
    }

    /// Destroy every enemy and bullet once a run has ended
    fn sweep_ended_run(&mut self) {
        if self.run_ended.replace(false) {
            log::debug!(
                "run ended: removing {} enemies and {} bullets",
                self.enemies.len(),
                self.bullets.len()
            );
            self.enemies.clear();
            self.bullets.clear();
        }
    }

    fn step_balls(&mut self, dt: f32) {
        let paddle = self.paddle.aabb();
        for ball in self.balls.snapshot() {
            if !ball.is_alive() {
                continue;
            }
            // Bricks may have been rebuilt by the previous ball
            let colliders = self.bricks.colliders();
            let step = ball.fixed_update(dt, Some(&paddle), &colliders);
            if let Some(id) = step.brick {
                if self.bricks.break_brick(id) {
                    self.emit(Feedback::BrickBroken);
                }
            }
            if step.lost {
                self.emit(Feedback::BallLost);
            }
        }
        self.balls.prune();
    }

    fn resolve_ship_contacts(&mut self) {
        if !self.state.is_playing() || !self.ship.is_active() {
            return;
        }
        let ship_pos = self.ship.pos();
        let ship_radius = self.ship.radius();
        for enemy in &mut self.enemies {
            if !enemy.is_alive() || !circles_overlap(ship_pos, ship_radius, enemy.pos, enemy.radius) {
                continue;
            }
            let outcome = self.ship.on_enemy_contact(enemy);
            if outcome.enemy_destroyed {
                self.feedback.borrow_mut().push(Feedback::EnemyDestroyed);
            }
            if outcome.life_lost {
                self.feedback.borrow_mut().push(Feedback::HitFlash);
            }
            if !self.ship.is_active() {
                break;
            }
        }
    }
}
