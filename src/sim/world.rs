/// World: every screen, the registries, the goodie catalog and the single
/// character, plus the editor entry points that build it.
///
/// ## Editing vs playing
///
/// Editor entry points (`place_tile`, `add_sprite`, ...) bypass gameplay
/// rules and validate only references: an unknown screen, hazard, conveyor
/// or sheet is an `Err(WorldError)`. `start()` switches to `Phase::Playing`;
/// from then on `update()` advances one fixed tick at a time.

use std::collections::BTreeMap;

use crate::config::Tuning;
use crate::consts::{GRID_COLS, GRID_ROWS};
use crate::domain::character::{Character, CHARACTER_SHEET};
use crate::domain::entity::{DamageCause, FrameInput};
use crate::domain::geometry::{ScreenId, FIRST_SCREEN};
use crate::domain::registry::{
    ConveyorId, ConveyorRef, ConveyorRegistry, DeathAnim, Goodie, GoodieKind, HazardDef, HazardId,
    HazardRegistry,
};
use crate::domain::sprite::{ImageMetrics, Sprite};
use crate::domain::tile::{Tile, TileId};
use crate::error::WorldError;

use super::event::GameEvent;
use super::screen::{CameFrom, Screen};
use super::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Editing,
    Playing,
    Won,
    Lost,
}

/// What an editor places in a cell. Stateful tiles always start fresh.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileSpec {
    Solid(TileId),
    Thru(TileId),
    Scenic(TileId),
    Hazard(HazardId),
    Conveyor(ConveyorRef),
    Collapsible(TileId),
}

pub struct World {
    pub(crate) screens: BTreeMap<ScreenId, Screen>,
    pub(crate) hazards: HazardRegistry,
    pub(crate) conveyors: ConveyorRegistry,
    pub(crate) goodies: Vec<Goodie>,
    pub(crate) character: Character,
    pub(crate) phase: Phase,
    pub(crate) score: u64,
    pub(crate) tuning: Tuning,
    pub(crate) metrics: Box<dyn ImageMetrics>,
    pub(crate) tick: u64,
}

// ── Construction ──

impl World {
    /// The image provider must already know the character sheet.
    pub fn new(tuning: Tuning, metrics: Box<dyn ImageMetrics>) -> Result<Self, WorldError> {
        tuning.validate()?;
        if metrics.sheet_size(CHARACTER_SHEET).is_none() {
            return Err(WorldError::UnknownSheet(CHARACTER_SHEET));
        }
        Ok(World {
            screens: BTreeMap::new(),
            hazards: HazardRegistry::new(),
            conveyors: ConveyorRegistry::new(),
            goodies: Vec::new(),
            character: Character::new(&tuning),
            phase: Phase::Editing,
            score: 0,
            tuning,
            metrics,
            tick: 0,
        })
    }

    /// Begin a session on `FIRST_SCREEN`: every screen and goodie is reset
    /// and the character is placed on the start tile.
    pub fn start(&mut self) -> Result<(), WorldError> {
        let (x, y) = self.screen(FIRST_SCREEN)?.start_point();
        for s in self.screens.values_mut() {
            s.reset();
            s.came_from = None;
        }
        for g in &mut self.goodies {
            g.taken = false;
            g.dead = false;
        }
        self.character = Character::new(&self.tuning);
        self.character.respawn(x, y, None, &self.tuning);
        self.character.grace_ticks = 0;
        if let Some(first) = self.screens.get_mut(&FIRST_SCREEN) {
            first.came_from = Some(CameFrom { x, y, momentum: self.character.momentum() });
        }
        self.score = 0;
        self.tick = 0;
        self.phase = Phase::Playing;
        log::info!("session started on screen {:?} at ({x}, {y})", FIRST_SCREEN);
        Ok(())
    }

    /// Advance one tick.
    pub fn update(&mut self, input: FrameInput) -> Vec<GameEvent> {
        step::step(self, input)
    }

    /// Kill the character outright; powerups do not protect against this.
    pub fn force_kill(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase == Phase::Playing {
            step::kill(self, DeathAnim::Collapse, DamageCause::Forced, &mut events);
        }
        events
    }
}

// ── Accessors ──

impl World {
    pub fn phase(&self) -> Phase { self.phase }

    pub fn score(&self) -> u64 { self.score }

    pub fn tick(&self) -> u64 { self.tick }

    pub fn tuning(&self) -> &Tuning { &self.tuning }

    pub fn character(&self) -> &Character { &self.character }

    pub fn metrics(&self) -> &dyn ImageMetrics { self.metrics.as_ref() }

    pub fn screen(&self, id: ScreenId) -> Result<&Screen, WorldError> {
        self.screens.get(&id).ok_or(WorldError::UnknownScreen(id))
    }

    pub fn screen_mut(&mut self, id: ScreenId) -> Result<&mut Screen, WorldError> {
        self.screens.get_mut(&id).ok_or(WorldError::UnknownScreen(id))
    }

    pub fn screen_ids(&self) -> impl Iterator<Item = ScreenId> + '_ {
        self.screens.keys().copied()
    }

    pub fn has_screen(&self, id: ScreenId) -> bool {
        self.screens.contains_key(&id)
    }

    /// The screen the character is on.
    pub fn active_screen(&self) -> Option<&Screen> {
        self.screens.get(&self.character.screen)
    }

    pub fn goodies(&self) -> &[Goodie] { &self.goodies }

    pub fn hazard(&self, id: HazardId) -> Option<&HazardDef> {
        self.hazards.get(id)
    }

    /// Keys needed to open the exit: every key placed in the world.
    pub fn keys_required(&self) -> u32 {
        self.goodies.iter().filter(|g| g.kind == GoodieKind::Key).count() as u32
    }
}

// ── Editor entry points ──

fn check_cell(row: usize, col: usize) -> Result<(), WorldError> {
    if row >= GRID_ROWS || col >= GRID_COLS {
        return Err(WorldError::OutOfGrid { row, col });
    }
    Ok(())
}

impl World {
    pub fn add_screen(&mut self, id: ScreenId) -> Result<&mut Screen, WorldError> {
        if self.screens.contains_key(&id) {
            return Err(WorldError::DuplicateScreen(id));
        }
        Ok(self.screens.entry(id).or_insert_with(|| Screen::new(id)))
    }

    pub fn place_tile(
        &mut self,
        screen: ScreenId,
        row: usize,
        col: usize,
        spec: TileSpec,
    ) -> Result<(), WorldError> {
        check_cell(row, col)?;
        let tile = match spec {
            TileSpec::Solid(id) => Tile::Solid(id),
            TileSpec::Thru(id) => Tile::Thru(id),
            TileSpec::Scenic(id) => Tile::Scenic(id),
            TileSpec::Hazard(def) => {
                if !self.hazards.contains(def) {
                    return Err(WorldError::UnknownHazard(def));
                }
                Tile::hazard(def)
            }
            TileSpec::Conveyor(c) => {
                if self.conveyors.get(c).is_none() {
                    return Err(WorldError::UnknownConveyor(c.id));
                }
                Tile::conveyor(c)
            }
            TileSpec::Collapsible(id) => Tile::collapsible(id),
        };
        self.screen_mut(screen)?.grid.set(row as i32, col as i32, tile);
        Ok(())
    }

    pub fn erase_tile(&mut self, screen: ScreenId, row: usize, col: usize) -> Result<(), WorldError> {
        check_cell(row, col)?;
        self.screen_mut(screen)?.grid.set(row as i32, col as i32, Tile::Empty);
        Ok(())
    }

    /// Place a goodie, replacing any goodie already in that cell.
    pub fn place_goodie(
        &mut self,
        screen: ScreenId,
        row: usize,
        col: usize,
        kind: GoodieKind,
    ) -> Result<(), WorldError> {
        check_cell(row, col)?;
        self.screen(screen)?;
        self.goodies.retain(|g| !(g.screen == screen && g.row == row && g.col == col));
        self.goodies.push(Goodie::new(kind, screen, row, col));
        Ok(())
    }

    pub fn remove_goodie(&mut self, screen: ScreenId, row: usize, col: usize) -> Result<Goodie, WorldError> {
        let idx = self
            .goodies
            .iter()
            .position(|g| g.screen == screen && g.row == row && g.col == col)
            .ok_or(WorldError::NoGoodie { screen, row, col })?;
        Ok(self.goodies.remove(idx))
    }

    pub fn set_character_start(&mut self, screen: ScreenId, row: usize, col: usize) -> Result<(), WorldError> {
        check_cell(row, col)?;
        self.screen_mut(screen)?.start = (row, col);
        Ok(())
    }

    /// Add a sprite; its sheet must be known to the image provider.
    pub fn add_sprite(&mut self, screen: ScreenId, mut sprite: Sprite) -> Result<(), WorldError> {
        if self.metrics.sheet_size(sprite.sheet).is_none() {
            return Err(WorldError::UnknownSheet(sprite.sheet));
        }
        sprite.init_frames(self.metrics.as_ref());
        self.screen_mut(screen)?.sprites.push(sprite);
        Ok(())
    }

    pub fn define_hazard(&mut self, def: HazardDef) {
        self.hazards.define(def);
    }

    pub fn replace_hazard(&mut self, def: HazardDef) -> Result<(), WorldError> {
        if self.hazards.replace(def) {
            Ok(())
        } else {
            Err(WorldError::UnknownHazard(def.id))
        }
    }

    /// Allocate a clockwise / anti-clockwise conveyor pair.
    pub fn allocate_conveyor(&mut self, id: ConveyorId) -> Result<[ConveyorRef; 2], WorldError> {
        self.conveyors.allocate(id).ok_or(WorldError::DuplicateConveyor(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::PixelRect;
    use crate::domain::registry::Rotation;
    use crate::domain::sprite::{AlphaMask, MaskLibrary, SheetId, SpriteKind};

    fn world() -> World {
        let lib = MaskLibrary::new().with(CHARACTER_SHEET, AlphaMask::opaque(160, 80));
        World::new(Tuning::default(), Box::new(lib)).unwrap()
    }

    #[test]
    fn character_sheet_is_required() {
        let err = World::new(Tuning::default(), Box::new(MaskLibrary::new())).err();
        assert_eq!(err, Some(WorldError::UnknownSheet(CHARACTER_SHEET)));
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let lib = MaskLibrary::new().with(CHARACTER_SHEET, AlphaMask::opaque(160, 80));
        let mut t = Tuning::default();
        t.damage_exponent = 0.5;
        assert!(matches!(World::new(t, Box::new(lib)), Err(WorldError::Tuning(_))));
    }

    #[test]
    fn editor_rejects_unknown_references() {
        let mut w = world();
        w.add_screen(ScreenId(0)).unwrap();
        assert_eq!(w.add_screen(ScreenId(0)).err(), Some(WorldError::DuplicateScreen(ScreenId(0))));
        assert_eq!(
            w.place_tile(ScreenId(0), 1, 1, TileSpec::Hazard(4)),
            Err(WorldError::UnknownHazard(4))
        );
        let cref = ConveyorRef { id: 2, rotation: Rotation::Clockwise };
        assert_eq!(
            w.place_tile(ScreenId(0), 1, 1, TileSpec::Conveyor(cref)),
            Err(WorldError::UnknownConveyor(2))
        );
        assert_eq!(
            w.place_tile(ScreenId(5), 1, 1, TileSpec::Solid(1)),
            Err(WorldError::UnknownScreen(ScreenId(5)))
        );
        assert_eq!(
            w.place_tile(ScreenId(0), 20, 1, TileSpec::Solid(1)),
            Err(WorldError::OutOfGrid { row: 20, col: 1 })
        );
        let sprite = Sprite::new(SheetId(77), (10, 10), (0.0, 0.0), PixelRect::new(0, 0, 10, 10), (0.0, 0.0), SpriteKind::Scenery);
        assert_eq!(w.add_sprite(ScreenId(0), sprite), Err(WorldError::UnknownSheet(SheetId(77))));
    }

    #[test]
    fn hazards_and_conveyors_register() {
        let mut w = world();
        let def = HazardDef { id: 1, explodes: true, death_anim: DeathAnim::Burn, harmless: false };
        assert_eq!(w.replace_hazard(def), Err(WorldError::UnknownHazard(1)));
        w.define_hazard(def);
        w.replace_hazard(HazardDef { harmless: true, ..def }).unwrap();
        assert!(w.hazard(1).unwrap().harmless);

        let [cw, acw] = w.allocate_conveyor(3).unwrap();
        assert_eq!((cw.rotation, acw.rotation), (Rotation::Clockwise, Rotation::AntiClockwise));
        assert_eq!(w.allocate_conveyor(3), Err(WorldError::DuplicateConveyor(3)));
    }

    #[test]
    fn goodies_replace_and_remove() {
        let mut w = world();
        w.add_screen(ScreenId(0)).unwrap();
        w.place_goodie(ScreenId(0), 2, 2, GoodieKind::Coin).unwrap();
        w.place_goodie(ScreenId(0), 2, 2, GoodieKind::Key).unwrap();
        assert_eq!(w.goodies().len(), 1);
        assert_eq!(w.keys_required(), 1);
        assert_eq!(w.remove_goodie(ScreenId(0), 2, 2).unwrap().kind, GoodieKind::Key);
        assert_eq!(
            w.remove_goodie(ScreenId(0), 2, 2).err(),
            Some(WorldError::NoGoodie { screen: ScreenId(0), row: 2, col: 2 })
        );
    }

    #[test]
    fn start_places_character_on_first_screen() {
        let mut w = world();
        assert_eq!(w.start(), Err(WorldError::UnknownScreen(FIRST_SCREEN)));
        w.add_screen(FIRST_SCREEN).unwrap();
        w.set_character_start(FIRST_SCREEN, 5, 3).unwrap();
        w.start().unwrap();
        assert_eq!(w.phase(), Phase::Playing);
        let c = w.character();
        assert_eq!((c.x, c.y), (60.0, 100.0));
        assert!(!c.is_highlighted());
        assert!(w.active_screen().unwrap().came_from.is_some());
    }
}
