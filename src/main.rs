/// Headless demo driver: builds the demo world and runs it at a fixed tick
/// rate with a scripted input pattern, routing events to the sound engine
/// and a logging listener.

use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};

use tilerunner::domain::entity::{Facing, FrameInput};
use tilerunner::sim::event::{dispatch_events, GameListener, SoundSink};
use tilerunner::sim::level;
use tilerunner::ui::sound::{Silence, SoundEngine};
use tilerunner::{GameConfig, Phase};

/// Logs score and lifecycle changes.
struct LogListener;

impl GameListener for LogListener {
    fn on_score(&mut self, delta: u64, total: u64) {
        log::info!("score +{delta} = {total}");
    }

    fn on_life_lost(&mut self, remaining: Option<u32>) {
        match remaining {
            Some(n) => log::info!("life lost, {n} left"),
            None => log::info!("life lost"),
        }
    }

    fn on_won(&mut self) { log::info!("level complete"); }

    fn on_lost(&mut self) { log::info!("game over"); }
}

/// Repeating walk/jump pattern.
fn scripted_input(tick: u64) -> FrameInput {
    match tick % 240 {
        0..=99 => FrameInput { movement: Some(Facing::Right), jump: tick % 40 == 20 },
        100 => FrameInput { movement: Some(Facing::Right), jump: true },
        101..=179 => FrameInput { movement: Some(Facing::Left), jump: false },
        180 => FrameInput { movement: Some(Facing::Left), jump: true },
        _ => FrameInput::default(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = GameConfig::load();
    let mut world = level::demo_world(config.tuning.clone())?;
    world.start()?;

    let engine = SoundEngine::new();
    if engine.is_none() {
        log::warn!("no audio device; running silent");
    }
    let sound: &dyn SoundSink = match &engine {
        Some(e) => e,
        None => &Silence,
    };
    let mut listener = LogListener;

    let tick_rate = Duration::from_millis(config.demo.tick_rate_ms);
    let mut last_tick = Instant::now();

    for tick in 0..config.demo.ticks {
        let events = world.update(scripted_input(tick));
        dispatch_events(&events, sound, &mut listener);
        if world.phase() != Phase::Playing {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed < tick_rate {
            thread::sleep(tick_rate - elapsed);
        }
        last_tick = Instant::now();
    }

    let c = world.character();
    println!();
    println!("Tile Runner demo finished after {} ticks ({:?})", world.tick(), world.phase());
    println!("Final Score: {}  Lives: {:?}  Screen: {:?}", world.score(), c.lives, c.screen);
    Ok(())
}
