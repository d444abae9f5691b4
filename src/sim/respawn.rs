/// Respawn safety search.
///
/// After the death animation, pick where the character comes back, in
/// priority order:
///
///   1. Death screen's `came_from`, when `last_on_ground` is set and the
///      entry point is verified (sprite-free drop onto a landable tile
///      within `CAME_FROM_SCAN_ROWS`, or a drop that leaves the screen).
///      Momentum is restored.
///   2. Death screen's `last_on_ground`, if sprite-safe.
///   3. History, most recent first: the first screen whose
///      `last_on_ground` is sprite-safe.
///   4. Oldest history screen (the death screen when history is empty):
///      its `came_from` if sprite-safe, else its designer start tile.
///
/// Tier 4's start tile is the only choice that is not checked against
/// sprites.

use crate::consts::{CHAR_H, CHAR_W, SCREEN_H, TILE_H};
use crate::domain::character::Momentum;
use crate::domain::geometry::{row_of, PixelRect, ScreenId};
use crate::domain::physics::GROUND_SAMPLE_XS;

use super::screen::{CameFrom, Screen};
use super::world::World;

/// How many tile rows below the feet a `came_from` scan looks for ground.
pub const CAME_FROM_SCAN_ROWS: i32 = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RespawnSource {
    CameFrom,
    LastOnGround,
    History(ScreenId),
    OldestCameFrom(ScreenId),
    StartTile(ScreenId),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RespawnChoice {
    pub screen: ScreenId,
    pub x: f64,
    pub y: f64,
    pub momentum: Option<Momentum>,
    pub source: RespawnSource,
}

/// Is dropping in at `cf` safe? The column under the entry box must be free
/// of lethal sprites down to the first landable row, which must come within
/// `CAME_FROM_SCAN_ROWS`; a scan that runs off the bottom counts as safe.
pub fn came_from_is_safe(screen: &Screen, cf: &CameFrom) -> bool {
    let x0 = cf.x.floor() as i32;
    let y0 = cf.y.floor() as i32;
    let first = row_of(y0 + CHAR_H);
    for row in first..first + CAME_FROM_SCAN_ROWS {
        let sy = row * TILE_H;
        if sy >= SCREEN_H {
            let scan = PixelRect::new(x0, y0, CHAR_W, (SCREEN_H - y0).max(CHAR_H));
            return screen.lethal_sprite_in(&scan).is_none();
        }
        let ground = GROUND_SAMPLE_XS
            .iter()
            .any(|&off| screen.grid.tile_at_pixel(x0 + off, sy).is_landable());
        if ground {
            let scan = PixelRect::new(x0, y0, CHAR_W, (sy - y0).max(CHAR_H));
            return screen.lethal_sprite_in(&scan).is_none();
        }
    }
    false
}

fn safe_last_on_ground(screen: &Screen) -> Option<(f64, f64)> {
    screen
        .last_on_ground
        .filter(|&(x, y)| screen.is_sprite_safe(x, y))
}

pub fn choose_respawn(world: &World) -> RespawnChoice {
    let died_on = world.character.screen;

    if let Some(screen) = world.screens.get(&died_on) {
        if screen.last_on_ground.is_some() {
            if let Some(cf) = screen.came_from.filter(|cf| came_from_is_safe(screen, cf)) {
                return RespawnChoice {
                    screen: died_on,
                    x: cf.x,
                    y: cf.y,
                    momentum: Some(cf.momentum),
                    source: RespawnSource::CameFrom,
                };
            }
            if let Some((x, y)) = safe_last_on_ground(screen) {
                return RespawnChoice {
                    screen: died_on,
                    x,
                    y,
                    momentum: None,
                    source: RespawnSource::LastOnGround,
                };
            }
        }
    }

    for id in world.character.history.iter() {
        let Some(screen) = world.screens.get(&id) else { continue };
        if let Some((x, y)) = safe_last_on_ground(screen) {
            return RespawnChoice { screen: id, x, y, momentum: None, source: RespawnSource::History(id) };
        }
    }

    let id = world.character.history.oldest().unwrap_or(died_on);
    let Some(screen) = world.screens.get(&id) else {
        debug_assert!(false, "respawn fallback screen {id:?} does not exist");
        return RespawnChoice { screen: id, x: 0.0, y: 0.0, momentum: None, source: RespawnSource::StartTile(id) };
    };
    if let Some(cf) = screen.came_from.filter(|cf| screen.is_sprite_safe(cf.x, cf.y)) {
        return RespawnChoice {
            screen: id,
            x: cf.x,
            y: cf.y,
            momentum: Some(cf.momentum),
            source: RespawnSource::OldestCameFrom(id),
        };
    }
    let (x, y) = screen.start_point();
    RespawnChoice { screen: id, x, y, momentum: None, source: RespawnSource::StartTile(id) }
}

/// Put the character at `choice`. Switching to a remembered screen rewinds
/// history past it; the target screen is not reset.
pub fn apply_respawn(world: &mut World, choice: &RespawnChoice) {
    let c = &mut world.character;
    if choice.screen != c.screen {
        c.history.rewind_to(choice.screen);
        c.screen = choice.screen;
    }
    c.respawn(choice.x, choice.y, choice.momentum, &world.tuning);
    log::debug!(
        "respawn on {:?} at ({:.1}, {:.1}) via {:?}",
        choice.screen, choice.x, choice.y, choice.source
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::character::CHARACTER_SHEET;
    use crate::domain::sprite::{AlphaMask, MaskLibrary, SheetId, Sprite, SpriteKind};
    use crate::sim::level;
    use proptest::prelude::*;

    const SPIKE: SheetId = SheetId(3);

    fn world() -> World {
        let lib = MaskLibrary::new()
            .with(CHARACTER_SHEET, AlphaMask::opaque(160, 80))
            .with(SPIKE, AlphaMask::opaque(20, 20));
        let mut w = World::new(Tuning::default(), Box::new(lib)).unwrap();
        level::define_standard_catalog(&mut w).unwrap();
        w
    }

    fn flat_screen(w: &mut World, id: ScreenId) {
        let mut rows = vec![""; 18];
        rows[2] = " S";
        rows.push("################################");
        level::load_screen(w, id, &rows).unwrap();
    }

    fn spike_at(x: f64, y: f64) -> Sprite {
        Sprite::new(SPIKE, (20, 20), (x, y), PixelRect::new(0, 0, 640, 400), (0.0, 0.0), SpriteKind::Harmful)
    }

    fn cf_at(x: f64, y: f64) -> CameFrom {
        CameFrom { x, y, momentum: Momentum::default() }
    }

    #[test]
    fn came_from_needs_ground_within_four_rows() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        let s = w.screen(ScreenId(0)).unwrap();
        // Floor is row 18 (y=360); feet at 360 → found immediately
        assert!(came_from_is_safe(s, &cf_at(100.0, 320.0)));
        // Feet at 300: rows 15..18 scanned, floor on the fourth
        assert!(came_from_is_safe(s, &cf_at(100.0, 260.0)));
        // Feet at 280: rows 14..17, no floor
        assert!(!came_from_is_safe(s, &cf_at(100.0, 240.0)));
    }

    #[test]
    fn came_from_scan_off_the_bottom_is_safe() {
        let mut w = world();
        level::load_screen(&mut w, ScreenId(0), &["S"]).unwrap();
        let s = w.screen(ScreenId(0)).unwrap();
        assert!(came_from_is_safe(s, &cf_at(100.0, 330.0)));
    }

    #[test]
    fn came_from_scan_rejects_sprite_in_drop() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        w.add_sprite(ScreenId(0), spike_at(110.0, 330.0)).unwrap();
        let s = w.screen(ScreenId(0)).unwrap();
        assert!(!came_from_is_safe(s, &cf_at(100.0, 260.0)));
    }

    #[test]
    fn prefers_came_from_with_momentum() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        w.start().unwrap();
        let s = w.screen_mut(ScreenId(0)).unwrap();
        s.came_from = Some(CameFrom {
            x: 100.0,
            y: 320.0,
            momentum: Momentum { vx: 4.0, vy: 0.0, jumping: false, conveyor: None },
        });
        s.last_on_ground = Some((300.0, 320.0));
        let choice = choose_respawn(&w);
        assert_eq!(choice.source, RespawnSource::CameFrom);
        assert_eq!(choice.momentum.map(|m| m.vx), Some(4.0));
    }

    #[test]
    fn no_last_on_ground_skips_tiers_one_and_two() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        w.start().unwrap();
        let choice = choose_respawn(&w);
        // history empty: fallback is the death screen's came_from (the start)
        assert_eq!(choice.source, RespawnSource::OldestCameFrom(ScreenId(0)));
    }

    #[test]
    fn unsafe_came_from_falls_back_to_last_on_ground() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        w.add_sprite(ScreenId(0), spike_at(100.0, 330.0)).unwrap();
        w.start().unwrap();
        let s = w.screen_mut(ScreenId(0)).unwrap();
        s.came_from = Some(cf_at(100.0, 320.0));
        s.last_on_ground = Some((400.0, 320.0));
        let choice = choose_respawn(&w);
        assert_eq!(choice.source, RespawnSource::LastOnGround);
        assert_eq!((choice.x, choice.y), (400.0, 320.0));
        assert!(choice.momentum.is_none());
    }

    #[test]
    fn history_walk_picks_most_recent_safe_screen() {
        let mut w = world();
        for i in 0..4 {
            flat_screen(&mut w, ScreenId(i));
        }
        w.start().unwrap();
        // Visited 1, 2, 3 then died on 0 with nowhere safe
        for i in 1..4 {
            w.character.history.push(ScreenId(i));
            w.screens.get_mut(&ScreenId(i)).unwrap().last_on_ground = Some((100.0 * i as f64, 320.0));
        }
        // Most recent (3) is unsafe
        w.add_sprite(ScreenId(3), spike_at(300.0, 330.0)).unwrap();
        w.screens.get_mut(&ScreenId(0)).unwrap().last_on_ground = None;

        let choice = choose_respawn(&w);
        assert_eq!(choice.source, RespawnSource::History(ScreenId(2)));
        assert_eq!((choice.x, choice.y), (200.0, 320.0));

        apply_respawn(&mut w, &choice);
        assert_eq!(w.character.screen, ScreenId(2));
        assert_eq!(w.character.history.iter().collect::<Vec<_>>(), vec![ScreenId(1)]);
    }

    #[test]
    fn last_resort_is_start_tile_of_oldest() {
        let mut w = world();
        flat_screen(&mut w, ScreenId(0));
        flat_screen(&mut w, ScreenId(1));
        w.start().unwrap();
        w.character.history.push(ScreenId(1));
        w.character.history.push(ScreenId(0));
        w.character.screen = ScreenId(1);
        let choice = choose_respawn(&w);
        // oldest is 1 (pushed first), with no came_from at all
        assert_eq!(choice.source, RespawnSource::StartTile(ScreenId(1)));
        assert_eq!((choice.x, choice.y), (20.0, 40.0));
    }

    proptest! {
        #[test]
        fn checked_choices_never_overlap_lethal_sprites(
            spikes in prop::collection::vec((0.0f64..620.0, 0.0f64..380.0), 0..12),
            log in prop::option::of((0.0f64..600.0, 0.0f64..320.0)),
            cf in prop::option::of((0.0f64..600.0, 0.0f64..320.0)),
            hist_log in prop::option::of((0.0f64..600.0, 0.0f64..320.0)),
        ) {
            let mut w = world();
            flat_screen(&mut w, ScreenId(0));
            flat_screen(&mut w, ScreenId(1));
            for &(x, y) in &spikes {
                w.add_sprite(ScreenId(0), spike_at(x, y)).unwrap();
                w.add_sprite(ScreenId(1), spike_at(y, x.min(380.0))).unwrap();
            }
            w.start().unwrap();
            w.character.history.push(ScreenId(1));
            {
                let s = w.screens.get_mut(&ScreenId(0)).unwrap();
                s.last_on_ground = log;
                s.came_from = cf.map(|(x, y)| cf_at(x, y));
            }
            w.screens.get_mut(&ScreenId(1)).unwrap().last_on_ground = hist_log;

            let choice = choose_respawn(&w);
            if !matches!(choice.source, RespawnSource::StartTile(_)) {
                let s = w.screen(choice.screen).unwrap();
                prop_assert!(s.is_sprite_safe(choice.x, choice.y), "{:?}", choice);
            }
        }
    }
}
