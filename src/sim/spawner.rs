//! Enemy spawner: a [`SpawnScheduler`] plus placement inside a spawn area

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use rand::Rng;

use super::enemy::EnemyKind;
use super::events::{EventKind, Subscription};
use super::scheduler::SpawnScheduler;
use super::state::{GameState, SharedRng, SharedState};
use crate::tuning::SpawnerTuning;
use crate::uniform;

/// A spawn the world should create this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: EnemyKind,
    pub pos: Vec2,
}

/// Uniform point inside a box of `size` centred at the origin, shrunk by `inset`
pub fn point_in_area<R: Rng>(rng: &mut R, size: Vec2, inset: f32) -> Vec2 {
    let half = (size * 0.5 - Vec2::splat(inset)).max(Vec2::ZERO);
    Vec2::new(uniform(rng, -half.x, half.x), uniform(rng, -half.y, half.y))
}

/// Uniform point on one of the four (inset) edges of a box centred at the origin
pub fn point_on_edge<R: Rng>(rng: &mut R, size: Vec2, inset: f32) -> Vec2 {
    let half = (size * 0.5 - Vec2::splat(inset)).max(Vec2::ZERO);
    match rng.random_range(0..4) {
        0 => Vec2::new(-half.x, uniform(rng, -half.y, half.y)),
        1 => Vec2::new(half.x, uniform(rng, -half.y, half.y)),
        2 => Vec2::new(uniform(rng, -half.x, half.x), -half.y),
        _ => Vec2::new(uniform(rng, -half.x, half.x), half.y),
    }
}

#[derive(Debug)]
pub struct EnemySpawner {
    center: Vec2,
    scheduler: Rc<RefCell<SpawnScheduler>>,
    tuning: SpawnerTuning,
    state: Weak<GameState>,
    rng: SharedRng,
    _subscriptions: Vec<Subscription>,
}

impl EnemySpawner {
    pub fn new(state: &SharedState, rng: &SharedRng, tuning: &SpawnerTuning, center: Vec2) -> Self {
        let scheduler = Rc::new(RefCell::new(SpawnScheduler::new(tuning.schedule.clone())));
        // Stagger the very first run like a fresh start would
        scheduler.borrow_mut().reset(true, &mut *rng.borrow_mut());

        let s = Rc::clone(&scheduler);
        let r = Rc::clone(rng);
        let on_start = state.events().subscribe(EventKind::GameStart, move |_| {
            s.borrow_mut().reset(true, &mut *r.borrow_mut());
        });
        let s = Rc::clone(&scheduler);
        let r = Rc::clone(rng);
        let on_over = state.events().subscribe(EventKind::GameOver, move |_| {
            s.borrow_mut().reset(false, &mut *r.borrow_mut());
        });

        Self {
            center,
            scheduler,
            tuning: tuning.clone(),
            state: Rc::downgrade(state),
            rng: Rc::clone(rng),
            _subscriptions: vec![on_start, on_over],
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn scheduler(&self) -> SpawnScheduler {
        self.scheduler.borrow().clone()
    }

    /// Advance the local clock; only ticks while playing
    pub fn update(&self, dt: f32) -> Vec<SpawnRequest> {
        if !self.state.upgrade().is_some_and(|s| s.is_playing()) {
            return Vec::new();
        }
        let mut rng = self.rng.borrow_mut();
        let count = self.scheduler.borrow_mut().update(dt, &mut *rng);
        (0..count)
            .map(|_| {
                let kind = EnemyKind::ALL[rng.random_range(0..EnemyKind::ALL.len())];
                let local = if self.tuning.spawn_on_edges {
                    point_on_edge(&mut *rng, self.tuning.area_size, self.tuning.edge_inset)
                } else {
                    point_in_area(&mut *rng, self.tuning.area_size, self.tuning.edge_inset)
                };
                SpawnRequest {
                    kind,
                    pos: self.center + local,
                }
            })
            .collect()
    }
}
