//! Central game state and lifecycle coordinator
//!
//! One `GameState` exists per world. Components receive a [`SharedState`]
//! handle at construction, read it through accessors and change it only
//! through its mutators. Each mutator updates one slice of state, releases
//! its borrow, then publishes the matching event, so handlers are free to
//! call back into the state.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{EventBus, GameEvent};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing moves
    #[default]
    StartingScreen,
    /// Active gameplay
    Playing,
    /// Run ended
    GameOver,
}

/// Axis-aligned playfield rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(Vec2::new(-8.0, -5.0), Vec2::new(8.0, 5.0))
    }
}

impl WorldBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds of a sprite of `size` centred at `center`
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Same rectangle with min/max ordered per axis
    pub fn sorted(&self) -> Self {
        Self::new(self.min.min(self.max), self.min.max(self.max))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Everything the coordinator owns
#[derive(Debug, Clone, Default)]
struct Counters {
    phase: GamePhase,
    score: u32,
    high_score: u32,
    last_score: u32,
    lives: u32,
    level: u32,
    change_level: bool,
    bounds: WorldBounds,
    total_bricks: u32,
    current_bricks: u32,
    player_position: Vec2,
}

/// The single authoritative game state
#[derive(Debug)]
pub struct GameState {
    counters: RefCell<Counters>,
    starting_lives: u32,
    events: EventBus,
}

/// Handle passed to every component
pub type SharedState = Rc<GameState>;

/// Seeded RNG shared by every component of one world
pub type SharedRng = Rc<RefCell<Pcg32>>;

/// Create the world RNG for a run seed
pub fn seeded_rng(seed: u64) -> SharedRng {
    Rc::new(RefCell::new(Pcg32::seed_from_u64(seed)))
}

impl GameState {
    /// Create the coordinator on the start screen
    pub fn new(starting_lives: u32, bounds: WorldBounds) -> SharedState {
        let starting_lives = starting_lives.max(1);
        Rc::new(Self {
            counters: RefCell::new(Counters {
                lives: starting_lives,
                bounds: bounds.sorted(),
                ..Counters::default()
            }),
            starting_lives,
            events: EventBus::new(),
        })
    }

    /// Event channels for subscribing
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn read(&self) -> Ref<'_, Counters> {
        self.counters.borrow()
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.read().phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase() == GamePhase::Playing
    }

    pub fn score(&self) -> u32 {
        self.read().score
    }

    pub fn high_score(&self) -> u32 {
        self.read().high_score
    }

    /// Final score of the most recently ended run
    pub fn last_score(&self) -> u32 {
        self.read().last_score
    }

    pub fn lives(&self) -> u32 {
        self.read().lives
    }

    pub fn starting_lives(&self) -> u32 {
        self.starting_lives
    }

    /// Levels cleared in the current run
    pub fn level(&self) -> u32 {
        self.read().level
    }

    /// True once the current run has advanced past its first grid
    pub fn changing_level(&self) -> bool {
        self.read().change_level
    }

    pub fn bounds(&self) -> WorldBounds {
        self.read().bounds
    }

    pub fn total_bricks(&self) -> u32 {
        self.read().total_bricks
    }

    pub fn current_bricks(&self) -> u32 {
        self.read().current_bricks
    }

    /// Remaining fraction of the grid (1 when no grid exists yet)
    pub fn brick_ratio(&self) -> f32 {
        let c = self.read();
        if c.total_bricks == 0 {
            1.0
        } else {
            c.current_bricks as f32 / c.total_bricks as f32
        }
    }

    /// Last published player position (enemy AI target)
    pub fn player_position(&self) -> Vec2 {
        self.read().player_position
    }

    // === Lifecycle ===

    /// Begin a fresh run
    pub fn start_game(&self) {
        {
            let mut c = self.counters.borrow_mut();
            c.phase = GamePhase::Playing;
            c.change_level = false;
            c.level = 0;
            c.score = 0;
            c.lives = self.starting_lives;
        }
        log::info!("Game start ({} lives)", self.starting_lives);
        self.events.publish(GameEvent::GameStart);
    }

    /// End the current run; does nothing if it already ended
    pub fn end_game(&self) {
        let (score, new_high) = {
            let mut c = self.counters.borrow_mut();
            if c.phase == GamePhase::GameOver {
                return;
            }
            c.phase = GamePhase::GameOver;
            c.change_level = false;
            let new_high = c.score > c.high_score;
            if new_high {
                c.high_score = c.score;
            }
            c.last_score = c.score;
            c.score = 0;
            (c.last_score, new_high)
        };

        log::info!("Game over: score {} (new high: {})", score, new_high);
        if new_high {
            self.events.publish(GameEvent::HighScoreChanged(score));
        }
        self.events.publish(GameEvent::ScoreChanged(0));
        self.events.publish(GameEvent::GameOver);
    }

    /// Return to the title screen
    pub fn show_start_screen(&self) {
        {
            let mut c = self.counters.borrow_mut();
            c.phase = GamePhase::StartingScreen;
            c.change_level = false;
        }
        self.events.publish(GameEvent::StartScreen);
    }

    /// Move to the next brick grid without leaving `Playing`
    pub fn advance_level(&self) {
        let level = {
            let mut c = self.counters.borrow_mut();
            c.level += 1;
            c.change_level = true;
            c.level
        };
        log::info!("Advancing to level {}", level);
        self.events.publish(GameEvent::NextLevel { level });
    }

    // === Counters ===

    pub fn increment_score(&self) {
        let score = {
            let mut c = self.counters.borrow_mut();
            c.score += 1;
            c.score
        };
        self.events.publish(GameEvent::ScoreChanged(score));
    }

    /// Lose a life; the transition to zero ends the run exactly once
    pub fn decrement_lives(&self) {
        let lives = {
            let mut c = self.counters.borrow_mut();
            if c.lives == 0 {
                return;
            }
            c.lives -= 1;
            c.lives
        };
        self.events.publish(GameEvent::LivesChanged(lives));
        if lives == 0 {
            self.end_game();
        }
    }

    /// Record a freshly generated grid of `n` bricks
    pub fn set_brick_count(&self, n: u32) {
        {
            let mut c = self.counters.borrow_mut();
            c.total_bricks = n;
            c.current_bricks = n;
        }
        self.events.publish(GameEvent::BricksCreated { total: n });
    }

    /// One brick fewer; clearing the grid advances the level
    pub fn decrement_brick_count(&self) {
        let (remaining, total) = {
            let mut c = self.counters.borrow_mut();
            if c.current_bricks == 0 {
                return;
            }
            c.current_bricks -= 1;
            (c.current_bricks, c.total_bricks)
        };
        self.events.publish(GameEvent::BrickDestroyed { remaining, total });
        if remaining == 0 {
            self.advance_level();
        }
    }

    pub fn set_player_position(&self, position: Vec2) {
        self.counters.borrow_mut().player_position = position;
    }

    pub fn set_world_bounds(&self, bounds: WorldBounds) {
        self.counters.borrow_mut().bounds = bounds.sorted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::EventKind;
    use std::cell::Cell;

    fn counter(state: &GameState, kind: EventKind) -> (Rc<Cell<u32>>, crate::sim::events::Subscription) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = state.events().subscribe(kind, move |_| h.set(h.get() + 1));
        (hits, sub)
    }

    #[test]
    fn test_state_machine_start_to_game_over() {
        let state = GameState::new(3, WorldBounds::default());
        assert_eq!(state.phase(), GamePhase::StartingScreen);

        state.start_game();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert_eq!(state.lives(), 3);

        let (overs, _sub) = counter(&state, EventKind::GameOver);
        for _ in 0..3 {
            state.decrement_lives();
        }
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert_eq!(overs.get(), 1);

        // Further calls neither go negative nor end the run again
        state.decrement_lives();
        state.decrement_lives();
        assert_eq!(state.lives(), 0);
        assert_eq!(overs.get(), 1);

        state.start_game();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert_eq!(state.lives(), 3);
    }

    #[test]
    fn test_high_score_only_on_strict_improvement() {
        let state = GameState::new(1, WorldBounds::default());
        let (highs, _sub) = counter(&state, EventKind::HighScoreChanged);

        state.start_game();
        for _ in 0..5 {
            state.increment_score();
        }
        state.end_game();
        assert_eq!(state.high_score(), 5);
        assert_eq!(state.last_score(), 5);
        assert_eq!(state.score(), 0);
        assert_eq!(highs.get(), 1);

        state.start_game();
        for _ in 0..5 {
            state.increment_score();
        }
        state.end_game();
        assert_eq!(state.high_score(), 5);
        assert_eq!(highs.get(), 1);

        state.start_game();
        for _ in 0..7 {
            state.increment_score();
        }
        state.decrement_lives();
        assert_eq!(state.high_score(), 7);
        assert_eq!(highs.get(), 2);
    }

    #[test]
    fn test_end_game_is_idempotent() {
        let state = GameState::new(2, WorldBounds::default());
        let (overs, _sub) = counter(&state, EventKind::GameOver);
        state.start_game();
        state.end_game();
        state.end_game();
        assert_eq!(overs.get(), 1);
    }

    #[test]
    fn test_clearing_bricks_advances_level_once() {
        let state = GameState::new(3, WorldBounds::default());
        let (levels, _sub) = counter(&state, EventKind::NextLevel);
        state.start_game();
        state.set_brick_count(3);
        assert_eq!(state.total_bricks(), 3);

        state.decrement_brick_count();
        state.decrement_brick_count();
        assert!((state.brick_ratio() - 1.0 / 3.0).abs() < 1e-6);
        state.decrement_brick_count();
        assert_eq!(levels.get(), 1);
        assert_eq!(state.level(), 1);
        assert!(state.changing_level());
        assert!(state.is_playing());

        // Nothing left to destroy
        state.decrement_brick_count();
        assert_eq!(levels.get(), 1);
        assert_eq!(state.current_bricks(), 0);
    }

    #[test]
    fn test_score_event_carries_new_value() {
        let state = GameState::new(3, WorldBounds::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = state
            .events()
            .subscribe(EventKind::ScoreChanged, move |e| s.borrow_mut().push(*e));
        state.start_game();
        state.increment_score();
        state.increment_score();
        assert_eq!(
            *seen.borrow(),
            vec![GameEvent::ScoreChanged(1), GameEvent::ScoreChanged(2)]
        );
    }

    #[test]
    fn test_handlers_can_read_state_during_publish() {
        let state = GameState::new(3, WorldBounds::default());
        let observed = Rc::new(Cell::new(0));
        let o = Rc::clone(&observed);
        let weak = Rc::downgrade(&state);
        let _sub = state.events().subscribe(EventKind::LivesChanged, move |_| {
            if let Some(state) = weak.upgrade() {
                o.set(state.lives());
            }
        });
        state.start_game();
        state.decrement_lives();
        assert_eq!(observed.get(), 2);
    }

    #[test]
    fn test_bounds_are_sorted() {
        let b = WorldBounds::new(Vec2::new(4.0, 3.0), Vec2::new(-4.0, -3.0)).sorted();
        assert_eq!(b.min, Vec2::new(-4.0, -3.0));
        assert!((b.width() - 8.0).abs() < 1e-6);
        assert!(b.contains(Vec2::ZERO));
        let s = WorldBounds::from_center_size(Vec2::new(1.0, 0.0), Vec2::new(2.0, 2.0));
        assert_eq!(s.min, Vec2::new(0.0, -1.0));
    }
}
