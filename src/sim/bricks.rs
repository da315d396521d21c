//! Brick grid generation and row progression

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::collision::Aabb;
use super::events::{EventKind, Subscription};
use super::geometry::hsv_to_rgb;
use super::state::{GameState, SharedState, WorldBounds};
use crate::tuning::BrickTuning;

/// A single brick
#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub row: u32,
    /// Linear RGB
    pub color: [f32; 3],
}

impl Brick {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// How many bricks of width `brick_w` fit across `usable_width` with `gap`
/// between neighbours (never fewer than one)
pub fn compute_columns(usable_width: f32, brick_w: f32, gap: f32) -> u32 {
    let pitch = brick_w + gap.max(0.0);
    if pitch <= 0.0 || !usable_width.is_finite() {
        return 1;
    }
    let columns = ((usable_width + gap.max(0.0)) / pitch).floor();
    if columns.is_finite() && columns >= 1.0 { columns as u32 } else { 1 }
}

/// Lay out `rows` rows centred horizontally, the first row at `y_scale` of
/// the world height and each following row one brick height + gap lower
pub fn layout_grid(bounds: &WorldBounds, tuning: &BrickTuning, rows: u32, first_id: u32) -> Vec<Brick> {
    let size = tuning.brick_size;
    let gap = tuning.gap.max(0.0);
    let usable_width = bounds.width() * tuning.x_scale;
    let min_x = bounds.center().x - usable_width * 0.5;
    let start_y = bounds.min.y + bounds.height() * tuning.y_scale;

    let columns = compute_columns(usable_width, size.x, gap);
    let grid_width = columns as f32 * size.x + (columns - 1) as f32 * gap;
    let start_x = min_x + (usable_width - grid_width) * 0.5 + size.x * 0.5;

    let mut bricks = Vec::with_capacity((rows * columns) as usize);
    let mut id = first_id;
    for r in 0..rows {
        let y = start_y - r as f32 * (size.y + gap);
        let color = hsv_to_rgb(r as f32 / rows as f32, tuning.saturation, tuning.value);
        for c in 0..columns {
            let x = start_x + c as f32 * (size.x + gap);
            bricks.push(Brick {
                id,
                pos: Vec2::new(x, y),
                size,
                row: r,
                color,
            });
            id = id.wrapping_add(1);
        }
    }
    bricks
}

#[derive(Debug, Default)]
struct Grid {
    rows: u32,
    bricks: Vec<Brick>,
    next_id: u32,
}

/// Owns the current brick grid and rebuilds it on lifecycle events
#[derive(Debug)]
pub struct BrickField {
    grid: Rc<RefCell<Grid>>,
    state: Weak<GameState>,
    _subscriptions: Vec<Subscription>,
}

impl BrickField {
    pub fn new(state: &SharedState, tuning: &BrickTuning) -> Self {
        let grid = Rc::new(RefCell::new(Grid {
            rows: tuning.starting_rows,
            ..Grid::default()
        }));
        let events = state.events();

        let g = Rc::clone(&grid);
        let s = Rc::downgrade(state);
        let t = tuning.clone();
        let on_start = events.subscribe(EventKind::GameStart, move |_| {
            g.borrow_mut().rows = t.starting_rows;
            rebuild(&g, &s, &t);
        });

        let g = Rc::clone(&grid);
        let s = Rc::downgrade(state);
        let t = tuning.clone();
        let on_next = events.subscribe(EventKind::NextLevel, move |_| {
            {
                let mut grid = g.borrow_mut();
                grid.rows = (grid.rows + 1).min(t.max_rows);
            }
            rebuild(&g, &s, &t);
        });

        let g = Rc::clone(&grid);
        let on_over = events.subscribe(EventKind::GameOver, move |_| {
            g.borrow_mut().bricks.clear();
        });

        Self {
            grid,
            state: Rc::downgrade(state),
            _subscriptions: vec![on_start, on_next, on_over],
        }
    }

    pub fn rows(&self) -> u32 {
        self.grid.borrow().rows
    }

    pub fn len(&self) -> usize {
        self.grid.borrow().bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.borrow().bricks.is_empty()
    }

    pub fn bricks(&self) -> Vec<Brick> {
        self.grid.borrow().bricks.clone()
    }

    /// Collision boxes of the remaining bricks
    pub fn colliders(&self) -> Vec<(u32, Aabb)> {
        self.grid.borrow().bricks.iter().map(|b| (b.id, b.aabb())).collect()
    }

    /// Ball contact: remove the brick, count it down and award a point
    ///
    /// Returns false for an unknown or already removed brick.
    pub fn break_brick(&self, id: u32) -> bool {
        let removed = {
            let mut grid = self.grid.borrow_mut();
            let index = grid.bricks.iter().position(|b| b.id == id);
            index.map(|i| grid.bricks.remove(i))
        };
        let Some(brick) = removed else {
            return false;
        };
        let Some(state) = self.state.upgrade() else {
            return true;
        };
        log::debug!("brick {} (row {}) destroyed", brick.id, brick.row);
        state.decrement_brick_count();
        state.increment_score();
        true
    }
}

fn rebuild(grid: &RefCell<Grid>, state: &Weak<GameState>, tuning: &BrickTuning) {
    let Some(state) = state.upgrade() else {
        log::warn!("brick grid rebuild skipped: no game state");
        return;
    };
    let count = {
        let mut g = grid.borrow_mut();
        let bricks = layout_grid(&state.bounds(), tuning, g.rows, g.next_id);
        g.next_id = g.next_id.wrapping_add(bricks.len() as u32);
        g.bricks = bricks;
        g.bricks.len() as u32
    };
    log::info!("Brick grid: {} rows, {} bricks", grid.borrow().rows, count);
    state.set_brick_count(count);
}
