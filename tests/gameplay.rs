use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use brick_blaster::consts::SIM_DT;
use brick_blaster::sim::{EventKind, Feedback, GamePhase, TickInput, World, WorldBounds};
use brick_blaster::Tuning;

fn quiet() -> Tuning {
    Tuning {
        spawner_count: 0,
        ..Tuning::default()
    }
}

/// 12.5-wide arena, full-width grid of 1-unit bricks: 10 columns
fn twenty_brick_tuning() -> Tuning {
    let mut t = quiet();
    t.world = WorldBounds::new(Vec2::new(-6.25, -5.0), Vec2::new(6.25, 5.0));
    t.bricks.x_scale = 1.0;
    t.bricks.starting_rows = 2;
    t
}

fn count(world: &World, kind: EventKind) -> (Rc<Cell<u32>>, brick_blaster::sim::Subscription) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let sub = world.state().events().subscribe(kind, move |_| h.set(h.get() + 1));
    (hits, sub)
}

// ── level progression ─────────────────────────────────────────────────────────

#[test]
fn clearing_twenty_bricks_advances_level_once() {
    let mut world = World::new(7, twenty_brick_tuning());
    let (levels, _sub) = count(&world, EventKind::NextLevel);
    world.start_game();

    assert_eq!(world.state().lives(), 3);
    assert_eq!(world.state().total_bricks(), 20);

    for brick in world.bricks() {
        assert!(world.brick_field().break_brick(brick.id));
    }

    assert_eq!(levels.get(), 1);
    assert_eq!(world.brick_field().rows(), 3);
    assert_eq!(world.state().current_bricks(), 30);
    assert_eq!(world.bricks().len(), 30);
    assert_eq!(world.state().score(), 20);
    assert!(world.state().is_playing());
}

#[test]
fn new_grid_replaces_the_ball() {
    let mut world = World::new(7, twenty_brick_tuning());
    world.start_game();
    let before = world.balls()[0].id;

    for brick in world.bricks() {
        world.brick_field().break_brick(brick.id);
    }
    world.frame(&TickInput::default(), SIM_DT);

    let balls = world.balls();
    assert_eq!(balls.len(), 1);
    assert_ne!(balls[0].id, before);
}

// ── shooting ──────────────────────────────────────────────────────────────────

#[test]
fn holding_fire_for_one_second_fires_five_shots() {
    let mut world = World::new(1, quiet());
    world.start_game();
    let fire = TickInput {
        fire_held: true,
        ..Default::default()
    };

    let mut shots = 0;
    for _ in 0..60 {
        world.frame(&fire, SIM_DT);
        shots += world
            .drain_feedback()
            .iter()
            .filter(|c| **c == Feedback::Shot)
            .count();
    }
    assert_eq!(shots, 5);
    assert_eq!(world.bullets().len(), 5);
}

// ── ball ──────────────────────────────────────────────────────────────────────

#[test]
fn respawned_ball_always_heads_upward() {
    let mut world = World::new(99, quiet());
    world.start_game();
    // Park the paddle in the corner so the ball eventually drops out
    let input = TickInput {
        left: true,
        ..Default::default()
    };

    let mut losses = 0;
    for _ in 0..(60 * 600) {
        world.frame(&input, SIM_DT);
        if world.drain_feedback().contains(&Feedback::BallLost) {
            losses += 1;
            let balls = world.balls();
            let ball = &balls[0];
            assert!(ball.direction().y >= 0.5, "direction {:?}", ball.direction());
            assert_eq!(ball.pos(), world.tuning().ball.starting_position);
        }
        if world.phase() == GamePhase::GameOver {
            break;
        }
    }
    assert!(losses > 0);
}

#[test]
fn losing_every_ball_ends_the_run() {
    let mut world = World::new(5, quiet());
    let (overs, _sub) = count(&world, EventKind::GameOver);
    world.start_game();
    let input = TickInput {
        left: true,
        ..Default::default()
    };
    for _ in 0..(60 * 1200) {
        world.frame(&input, SIM_DT);
        if world.phase() == GamePhase::GameOver {
            break;
        }
    }
    assert_eq!(world.phase(), GamePhase::GameOver);
    assert_eq!(overs.get(), 1);
    assert_eq!(world.state().lives(), 0);
    assert!(world.bricks().is_empty());
    assert!(!world.paddle().visible());
    assert!(!world.ship().is_active());
}

// ── lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn lives_run_out_exactly_once() {
    let mut world = World::new(3, quiet());
    let (overs, _sub) = count(&world, EventKind::GameOver);
    world.start_game();
    for _ in 0..3 {
        world.state().decrement_lives();
    }
    world.state().decrement_lives();
    assert_eq!(overs.get(), 1);
    assert_eq!(world.state().lives(), 0);
    assert_eq!(world.phase(), GamePhase::GameOver);
}

#[test]
fn restart_after_game_over_restores_everything() {
    let mut world = World::new(3, quiet());
    world.start_game();
    world.state().increment_score();
    world.state().end_game();
    assert_eq!(world.state().last_score(), 1);

    let start = TickInput {
        start: true,
        ..Default::default()
    };
    world.frame(&start, SIM_DT);
    assert_eq!(world.phase(), GamePhase::Playing);
    assert_eq!(world.state().lives(), 3);
    assert_eq!(world.state().score(), 0);
    assert_eq!(world.state().high_score(), 1);
    assert_eq!(world.bricks().len(), 36);
    assert!(world.ship().is_active());
    assert!(world.balls().iter().all(|b| b.visible()));
}

// ── enemies ───────────────────────────────────────────────────────────────────

#[test]
fn enemies_spawn_during_play_and_vanish_on_game_over() {
    let mut t = Tuning::default();
    t.spawner.schedule.trigger_chance = 1.0;
    let mut world = World::new(11, t);
    world.start_game();

    let mut peak = 0;
    for _ in 0..(60 * 8) {
        world.frame(&TickInput::default(), SIM_DT);
        peak = peak.max(world.enemies().len());
        if world.phase() != GamePhase::Playing {
            break;
        }
    }
    assert!(peak > 0);

    world.state().end_game();
    world.frame(&TickInput::default(), SIM_DT);
    assert!(world.enemies().is_empty());

    // Spawners are idle until the next run
    for _ in 0..(60 * 10) {
        world.frame(&TickInput::default(), SIM_DT);
    }
    assert!(world.enemies().is_empty());
}

#[test]
fn partial_tuning_file_drives_the_world() {
    let tuning = Tuning::from_json_str(r#"{ "starting_lives": 5, "bricks": { "starting_rows": 1 } }"#)
        .expect("valid tuning");
    let mut world = World::new(1, tuning);
    world.start_game();
    assert_eq!(world.state().lives(), 5);
    assert_eq!(world.bricks().len(), 12);
}
