//! Breakout ball and the spawner that replaces it on every new grid

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec2;
use rand::Rng;

use super::collision::{Aabb, ball_wall_collision, below_floor, circle_aabb_collision};
use super::events::{EventKind, GameEvent, Subscription};
use super::geometry::{PaddleContact, lerp, obstacle_reflect, paddle_reflect};
use super::state::{GameState, SharedRng, SharedState};
use crate::consts::DEGENERATE_SQ;
use crate::tuning::BallTuning;
use crate::uniform;

/// Mutable ball state
#[derive(Debug, Clone)]
pub struct BallBody {
    pub pos: Vec2,
    /// Unit travel direction
    pub direction: Vec2,
    pub speed: f32,
    pub visible: bool,
    alive: bool,
}

/// What happened to the ball during one fixed step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BallStep {
    pub hit_paddle: bool,
    pub hit_wall: bool,
    /// Brick the ball bounced off, if any
    pub brick: Option<u32>,
    /// Dropped out through the bottom edge (a life was lost)
    pub lost: bool,
}

/// A live ball
///
/// Owns its subscriptions, so dropping the last handle detaches it from
/// the event bus.
#[derive(Debug)]
pub struct Ball {
    pub id: u32,
    body: Rc<RefCell<BallBody>>,
    tuning: BallTuning,
    state: Weak<GameState>,
    rng: SharedRng,
    _subscriptions: Vec<Subscription>,
}

impl Ball {
    pub fn new(id: u32, state: &SharedState, rng: &SharedRng, tuning: &BallTuning) -> Self {
        let body = Rc::new(RefCell::new(BallBody {
            pos: tuning.starting_position,
            direction: Vec2::Y,
            speed: tuning.starting_speed,
            visible: true,
            alive: true,
        }));

        let events = state.events();
        let mut subscriptions = Vec::with_capacity(4);

        // A fresh grid always gets a fresh ball; this one retires
        let b = Rc::clone(&body);
        subscriptions.push(events.subscribe(EventKind::BricksCreated, move |_| {
            b.borrow_mut().alive = false;
        }));

        let b = Rc::clone(&body);
        let starting_speed = tuning.starting_speed;
        let speed_up = tuning.speed_up_scale;
        subscriptions.push(events.subscribe(EventKind::BrickDestroyed, move |event| {
            if let GameEvent::BrickDestroyed { remaining, total } = *event {
                let ratio = if total == 0 { 1.0 } else { remaining as f32 / total as f32 };
                b.borrow_mut().speed = starting_speed * speed_up * lerp(1.0, 0.5, ratio);
            }
        }));

        let b = Rc::clone(&body);
        subscriptions.push(events.subscribe(EventKind::GameStart, move |_| {
            b.borrow_mut().visible = true;
        }));
        let b = Rc::clone(&body);
        subscriptions.push(events.subscribe(EventKind::GameOver, move |_| {
            b.borrow_mut().visible = false;
        }));

        Self {
            id,
            body,
            tuning: tuning.clone(),
            state: Rc::downgrade(state),
            rng: Rc::clone(rng),
            _subscriptions: subscriptions,
        }
    }

    pub fn body(&self) -> BallBody {
        self.body.borrow().clone()
    }

    pub fn pos(&self) -> Vec2 {
        self.body.borrow().pos
    }

    pub fn direction(&self) -> Vec2 {
        self.body.borrow().direction
    }

    pub fn speed(&self) -> f32 {
        self.body.borrow().speed
    }

    pub fn radius(&self) -> f32 {
        self.tuning.radius
    }

    pub fn visible(&self) -> bool {
        self.body.borrow().visible
    }

    pub fn is_alive(&self) -> bool {
        self.body.borrow().alive
    }

    /// Back to the starting point with a fresh upward-biased direction
    pub fn reset(&self) {
        let direction =
            random_launch_direction(&mut *self.rng.borrow_mut(), self.tuning.max_paddle_angle_deg);
        let mut body = self.body.borrow_mut();
        body.pos = self.tuning.starting_position;
        body.direction = direction;
    }

    /// Integrate one fixed step and resolve contacts
    ///
    /// Paddle hits use the paddle launch rule; bricks and walls bounce like
    /// any obstacle. Brick removal is left to the caller, which owns the grid.
    pub fn fixed_update(&self, dt: f32, paddle: Option<&Aabb>, bricks: &[(u32, Aabb)]) -> BallStep {
        let Some(state) = self.state.upgrade() else {
            log::warn!("ball {} outlived its game state", self.id);
            return BallStep::default();
        };
        if !state.is_playing() || !self.is_alive() {
            return BallStep::default();
        }

        let bounds = state.bounds();
        let radius = self.tuning.radius;
        let mut step = BallStep::default();
        {
            let mut body = self.body.borrow_mut();
            let travel = body.direction * body.speed * dt;
            body.pos += travel;

            if let Some(paddle) = paddle {
                let contact = circle_aabb_collision(body.pos, radius, paddle);
                if contact.hit {
                    body.pos += contact.normal * contact.penetration;
                    if body.direction.dot(contact.normal) < 0.0 {
                        let paddle_contact = PaddleContact {
                            point: contact.point,
                            normal: contact.normal,
                            paddle_center_x: paddle.center.x,
                            paddle_half_width: paddle.half_extents.x,
                        };
                        body.direction = paddle_reflect(
                            body.direction,
                            &paddle_contact,
                            self.tuning.max_paddle_angle_deg,
                            self.tuning.min_obstacle_angle_deg,
                        );
                    }
                    step.hit_paddle = true;
                }
            }

            // Deepest brick contact wins; one brick per step
            let brick_hit = bricks
                .iter()
                .map(|(id, aabb)| (*id, circle_aabb_collision(body.pos, radius, aabb)))
                .filter(|(_, c)| c.hit)
                .max_by(|a, b| a.1.penetration.total_cmp(&b.1.penetration));
            if let Some((id, contact)) = brick_hit {
                body.pos += contact.normal * contact.penetration;
                body.direction = self.bounce(body.direction, contact.normal);
                step.brick = Some(id);
            }

            let wall = ball_wall_collision(body.pos, radius, &bounds);
            if wall.hit {
                body.pos += wall.normal * wall.penetration;
                body.direction = self.bounce(body.direction, wall.normal);
                step.hit_wall = true;
            }

            step.lost = below_floor(body.pos, radius, &bounds);
        }

        if step.lost {
            log::debug!("ball {} lost", self.id);
            state.decrement_lives();
            self.reset();
        }
        step
    }

    /// Obstacle bounce, only when travelling into the surface
    fn bounce(&self, direction: Vec2, normal: Vec2) -> Vec2 {
        if direction.dot(normal) >= 0.0 {
            return direction;
        }
        let reflected = obstacle_reflect(direction, normal, self.tuning.min_obstacle_angle_deg);
        if reflected.length_squared() < DEGENERATE_SQ {
            direction
        } else {
            reflected
        }
    }
}

/// Launch direction with `x ∈ [-θmax/90, θmax/90]`, `y ∈ [0.5, 1]`, normalised
pub fn random_launch_direction<R: Rng>(rng: &mut R, max_paddle_angle_deg: f32) -> Vec2 {
    let spread = max_paddle_angle_deg / 90.0;
    let x = uniform(rng, -spread, spread);
    let y = uniform(rng, 0.5, 1.0);
    Vec2::new(x, y).normalize_or(Vec2::Y)
}

/// The live balls of one world, shared with the spawner
pub type BallList = Rc<RefCell<Vec<Rc<Ball>>>>;

/// Spawns a fresh ball at the starting position whenever a grid is created
#[derive(Debug)]
pub struct BallSpawner {
    balls: BallList,
    _subscription: Subscription,
}

impl BallSpawner {
    pub fn new(state: &SharedState, rng: &SharedRng, tuning: &BallTuning) -> Self {
        let balls: BallList = Rc::new(RefCell::new(Vec::new()));
        let next_id = Rc::new(Cell::new(0u32));

        let list = Rc::clone(&balls);
        let weak_state = Rc::downgrade(state);
        let rng = Rc::clone(rng);
        let tuning = tuning.clone();
        let subscription = state.events().subscribe(EventKind::BricksCreated, move |_| {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            let id = next_id.get();
            next_id.set(id.wrapping_add(1));

            let ball = Ball::new(id, &state, &rng, &tuning);
            ball.reset();
            log::debug!("spawned ball {} heading {:?}", id, ball.direction());
            list.borrow_mut().push(Rc::new(ball));
        });

        Self {
            balls,
            _subscription: subscription,
        }
    }

    pub fn balls(&self) -> &BallList {
        &self.balls
    }

    /// Handles to the current balls, safe to iterate while events fire
    pub fn snapshot(&self) -> Vec<Rc<Ball>> {
        self.balls.borrow().clone()
    }

    /// Drop balls retired by a grid rebuild
    pub fn prune(&self) {
        let retired: Vec<Rc<Ball>> = {
            let mut balls = self.balls.borrow_mut();
            let (alive, retired): (Vec<_>, Vec<_>) = balls.drain(..).partition(|b| b.is_alive());
            *balls = alive;
            retired
        };
        // Unsubscribe outside the list borrow
        drop(retired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{WorldBounds, seeded_rng};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn playing_state() -> SharedState {
        let state = GameState::new(3, WorldBounds::default());
        state.start_game();
        state
    }

    fn ball(state: &SharedState) -> Ball {
        Ball::new(0, state, &seeded_rng(1), &BallTuning::default())
    }

    #[test]
    fn test_launch_direction_is_upward_biased() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..1000 {
            let d = random_launch_direction(&mut rng, 60.0);
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.y >= 0.5, "direction {:?}", d);
        }
    }

    #[test]
    fn test_brick_destroyed_speeds_ball_up() {
        let state = playing_state();
        let tuning = BallTuning::default();
        let rng = seeded_rng(5);
        let ball = Ball::new(0, &state, &rng, &tuning);

        state.set_brick_count(4);
        // The ball retires on a new grid, so build one first and then a new ball
        let ball2 = Ball::new(1, &state, &rng, &tuning);
        assert!(!ball.is_alive());

        state.decrement_brick_count();
        // 7.5 · 2 · lerp(1, 0.5, 0.75)
        assert!((ball2.speed() - 9.375).abs() < 1e-4);
        state.decrement_brick_count();
        state.decrement_brick_count();
        assert!((ball2.speed() - 15.0 * 0.875).abs() < 1e-4);
    }

    #[test]
    fn test_visibility_follows_lifecycle() {
        let state = playing_state();
        let ball = ball(&state);
        state.end_game();
        assert!(!ball.visible());
        state.start_game();
        assert!(ball.visible());
    }

    #[test]
    fn test_ball_does_not_move_outside_play() {
        let state = GameState::new(3, WorldBounds::default());
        let ball = ball(&state);
        let before = ball.pos();
        ball.fixed_update(DT, None, &[]);
        assert_eq!(ball.pos(), before);
    }

    #[test]
    fn test_top_wall_bounce() {
        let state = playing_state();
        let ball = ball(&state);
        {
            let mut body = ball.body.borrow_mut();
            body.pos = Vec2::new(0.0, 4.9);
            body.direction = Vec2::new(0.6, 0.8);
        }
        let step = ball.fixed_update(DT, None, &[]);
        assert!(step.hit_wall);
        assert!((ball.direction() - Vec2::new(0.6, -0.8)).length() < 1e-4);
        assert!(ball.pos().y + ball.radius() <= 5.0 + 1e-5);
    }

    #[test]
    fn test_paddle_center_hit_goes_straight_up() {
        let state = playing_state();
        let ball = ball(&state);
        let paddle = Aabb::new(Vec2::new(0.0, -4.0), Vec2::new(2.0, 0.3));
        {
            let mut body = ball.body.borrow_mut();
            body.pos = Vec2::new(0.0, -3.72);
            body.direction = Vec2::NEG_Y;
        }
        let step = ball.fixed_update(DT, Some(&paddle), &[]);
        assert!(step.hit_paddle);
        assert!((ball.direction() - Vec2::Y).length() < 1e-4);
    }

    #[test]
    fn test_brick_hit_reports_id_and_bounces() {
        let state = playing_state();
        let ball = ball(&state);
        let bricks = [(7, Aabb::new(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.4)))];
        {
            let mut body = ball.body.borrow_mut();
            body.pos = Vec2::new(0.0, 1.7);
            body.direction = Vec2::new(0.0, 1.0);
        }
        let step = ball.fixed_update(DT, None, &bricks);
        assert_eq!(step.brick, Some(7));
        assert!(ball.direction().y < 0.0);
    }

    #[test]
    fn test_bottom_exit_costs_a_life_and_resets() {
        let state = playing_state();
        let tuning = BallTuning::default();
        let ball = Ball::new(0, &state, &seeded_rng(9), &tuning);
        {
            let mut body = ball.body.borrow_mut();
            body.pos = Vec2::new(0.0, -5.1);
            body.direction = Vec2::NEG_Y;
        }
        let step = ball.fixed_update(DT, None, &[]);
        assert!(step.lost);
        assert_eq!(state.lives(), 2);
        assert_eq!(ball.pos(), tuning.starting_position);
        assert!(ball.direction().y >= 0.5);
    }

    #[test]
    fn test_spawner_replaces_ball_on_new_grid() {
        let state = playing_state();
        let rng = seeded_rng(3);
        let spawner = BallSpawner::new(&state, &rng, &BallTuning::default());

        state.set_brick_count(10);
        assert_eq!(spawner.snapshot().len(), 1);
        let first = spawner.snapshot()[0].id;

        state.set_brick_count(12);
        spawner.prune();
        let balls = spawner.snapshot();
        assert_eq!(balls.len(), 1);
        assert_ne!(balls[0].id, first);
        assert!(balls[0].is_alive());
    }

    #[test]
    fn test_pruned_ball_unsubscribes() {
        let state = playing_state();
        let rng = seeded_rng(4);
        let spawner = BallSpawner::new(&state, &rng, &BallTuning::default());
        state.set_brick_count(5);
        let with_one = state.events().subscriber_count(EventKind::BrickDestroyed);
        state.set_brick_count(5);
        spawner.prune();
        assert_eq!(state.events().subscriber_count(EventKind::BrickDestroyed), with_one);
    }
}
