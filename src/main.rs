//! Brick Blaster headless runner
//!
//! Plays the simulation with a simple autopilot and logs what happened.
//! Usage: `brick-blaster [--seed N] [--seconds S] [--tuning FILE] [--dump-tuning]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use brick_blaster::consts::SIM_DT;
use brick_blaster::sim::{AimInput, Feedback, GamePhase, TickInput, World};
use brick_blaster::{Tuning, TuningError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Brick Blaster simulation", long_about = None)]
struct Args {
    /// World RNG seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Simulated play time in seconds
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,
    /// JSON tuning file (missing fields keep their defaults)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Print the effective tuning as JSON and exit
    #[arg(long)]
    dump_tuning: bool,
}

/// Track the lowest ball with the paddle; keep away from and shoot at the nearest enemy
fn autopilot(world: &World) -> TickInput {
    let mut input = TickInput {
        fire_held: true,
        start: world.phase() != GamePhase::Playing,
        ..Default::default()
    };

    let paddle_x = world.paddle().pos().x;
    if let Some(ball) = world
        .balls()
        .iter()
        .filter(|b| b.is_alive())
        .min_by(|a, b| a.pos().y.total_cmp(&b.pos().y))
    {
        let dx = ball.pos().x - paddle_x;
        input.left = dx < -0.2;
        input.right = dx > 0.2;
    }

    let ship = world.ship().pos();
    if let Some(enemy) = world
        .enemies()
        .iter()
        .min_by(|a, b| a.pos.distance_squared(ship).total_cmp(&b.pos.distance_squared(ship)))
    {
        input.aim = Some(AimInput::Pointer(enemy.pos));
        let away = ship - enemy.pos;
        if away.length_squared() < 9.0 {
            input.movement = away.normalize_or_zero();
        }
    } else {
        // Drift back toward the middle
        input.movement = (-ship).clamp_length_max(1.0);
        input.aim = Some(AimInput::Pointer(ship + Vec2::Y));
    }
    input
}

fn load_tuning(path: Option<&Path>) -> Result<Tuning, TuningError> {
    match path {
        Some(path) => Tuning::load(path),
        None => Ok(Tuning::default()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let tuning = match load_tuning(args.tuning.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to load tuning: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.dump_tuning {
        return match tuning.to_json_string() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize tuning: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    log::info!("Brick Blaster (headless) starting with seed {}", args.seed);
    let mut world = World::new(args.seed, tuning);

    let frames = (args.seconds.max(0.0) / SIM_DT) as u64;
    let (mut runs, mut bricks, mut kills, mut shots) = (0u32, 0u32, 0u32, 0u32);
    for _ in 0..frames {
        let input = autopilot(&world);
        if input.start {
            runs += 1;
        }
        world.frame(&input, SIM_DT);
        for cue in world.drain_feedback() {
            match cue {
                Feedback::BrickBroken => bricks += 1,
                Feedback::EnemyDestroyed => kills += 1,
                Feedback::Shot => shots += 1,
                _ => {}
            }
        }
    }

    let state = world.state();
    log::info!(
        "Done: {} runs, {} bricks, {} enemies, {} shots, level {}, score {}, high score {}",
        runs,
        bricks,
        kills,
        shots,
        state.level(),
        state.score(),
        state.high_score()
    );
    println!(
        "runs={} bricks={} enemies={} shots={} high_score={}",
        runs,
        bricks,
        kills,
        shots,
        state.high_score().max(state.score())
    );
    ExitCode::SUCCESS
}
