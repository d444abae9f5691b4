/// Events emitted during a simulation step.
/// The driver routes them to sound and listener collaborators; neither may
/// reach back into the world.

use crate::domain::entity::{DamageCause, PowerupKind};
use crate::domain::geometry::ScreenId;
use crate::domain::registry::{DeathAnim, GoodieKind, PlayMode, SoundEffect};

use super::respawn::RespawnSource;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Sound { effect: SoundEffect, mode: PlayMode },
    StopSound { effect: SoundEffect },
    ScoreChanged { delta: u64, total: u64 },
    GoodieCollected { kind: GoodieKind, row: usize, col: usize },
    Jumped,
    Landed { airborne_ticks: u32, damage: u32 },
    HazardTriggered { row: i32, col: i32, exploded: bool },
    CollapsibleTriggered { row: i32, col: i32 },
    CharacterKilled { anim: DeathAnim, cause: DamageCause },
    LifeLost { remaining: Option<u32> },
    Respawned { screen: ScreenId, source: RespawnSource },
    ScreenChanged { from: ScreenId, to: ScreenId },
    PowerupGranted { kind: PowerupKind },
    PowerupExpired { kind: PowerupKind },
    GameWon,
    GameLost,
}

/// Audio collaborator.
pub trait SoundSink {
    fn play(&self, effect: SoundEffect, mode: PlayMode);
    /// Stop a looping effect. No-op if it is not playing.
    fn stop(&self, effect: SoundEffect);
}

/// Score / lifecycle observer, e.g. a HUD or high-score table.
pub trait GameListener {
    fn on_score(&mut self, _delta: u64, _total: u64) {}
    fn on_life_lost(&mut self, _remaining: Option<u32>) {}
    fn on_won(&mut self) {}
    fn on_lost(&mut self) {}
}

/// Feed one tick's events to the collaborators.
pub fn dispatch_events(
    events: &[GameEvent],
    sound: &dyn SoundSink,
    listener: &mut dyn GameListener,
) {
    for ev in events {
        match *ev {
            GameEvent::Sound { effect, mode } => sound.play(effect, mode),
            GameEvent::StopSound { effect } => sound.stop(effect),
            GameEvent::ScoreChanged { delta, total } => listener.on_score(delta, total),
            GameEvent::LifeLost { remaining } => listener.on_life_lost(remaining),
            GameEvent::GameWon => listener.on_won(),
            GameEvent::GameLost => listener.on_lost(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sounds: RefCell<Vec<(SoundEffect, Option<PlayMode>)>>,
        score: u64,
        lives: Vec<Option<u32>>,
        won: bool,
    }

    impl SoundSink for Recorder {
        fn play(&self, effect: SoundEffect, mode: PlayMode) {
            self.sounds.borrow_mut().push((effect, Some(mode)));
        }
        fn stop(&self, effect: SoundEffect) {
            self.sounds.borrow_mut().push((effect, None));
        }
    }

    impl GameListener for Recorder {
        fn on_score(&mut self, _delta: u64, total: u64) { self.score = total; }
        fn on_life_lost(&mut self, remaining: Option<u32>) { self.lives.push(remaining); }
        fn on_won(&mut self) { self.won = true; }
    }

    #[test]
    fn routes_events_to_collaborators() {
        let events = vec![
            GameEvent::Sound { effect: SoundEffect::Conveyor, mode: PlayMode::Loop },
            GameEvent::ScoreChanged { delta: 10, total: 110 },
            GameEvent::Jumped,
            GameEvent::StopSound { effect: SoundEffect::Conveyor },
            GameEvent::LifeLost { remaining: Some(2) },
            GameEvent::GameWon,
        ];
        let sink = Recorder::default();
        let mut listener = Recorder::default();
        dispatch_events(&events, &sink, &mut listener);
        assert_eq!(
            *sink.sounds.borrow(),
            vec![(SoundEffect::Conveyor, Some(PlayMode::Loop)), (SoundEffect::Conveyor, None)]
        );
        assert_eq!(listener.score, 110);
        assert_eq!(listener.lives, vec![Some(2)]);
        assert!(listener.won);
    }
}
