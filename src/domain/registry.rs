/// World-level catalogs referenced by id from tile cells and goodies.
///
/// Tiles store only a reference (`HazardId`, `ConveyorRef`); behaviour
/// lives in the definition here. Per-placement *state* (armed / exploding,
/// animation frame) never lives here, it lives in the tile cell.

use std::collections::BTreeMap;

use super::entity::PowerupKind;
use super::geometry::ScreenId;

// ══════════════════════════════════════════════════════════════
// Hazards
// ══════════════════════════════════════════════════════════════

pub type HazardId = u16;

/// Which terminal animation plays when something kills the character.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathAnim {
    Collapse,
    Burn,
    Zap,
    Splat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HazardDef {
    pub id: HazardId,
    /// Plays an explosion and goes dead once triggered.
    pub explodes: bool,
    pub death_anim: DeathAnim,
    /// Triggers (and may explode) but never kills.
    pub harmless: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HazardRegistry {
    defs: BTreeMap<HazardId, HazardDef>,
}

impl HazardRegistry {
    pub fn new() -> Self {
        HazardRegistry::default()
    }

    /// Insert or overwrite a definition.
    pub fn define(&mut self, def: HazardDef) {
        self.defs.insert(def.id, def);
    }

    /// Replace an existing definition. Returns false if `def.id` is unknown.
    pub fn replace(&mut self, def: HazardDef) -> bool {
        match self.defs.get_mut(&def.id) {
            Some(slot) => { *slot = def; true }
            None => false,
        }
    }

    pub fn get(&self, id: HazardId) -> Option<&HazardDef> {
        self.defs.get(&id)
    }

    pub fn contains(&self, id: HazardId) -> bool {
        self.defs.contains_key(&id)
    }
}

// ══════════════════════════════════════════════════════════════
// Conveyors
// ══════════════════════════════════════════════════════════════

pub type ConveyorId = u16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Rotation {
    /// Top surface moves right.
    Clockwise,
    /// Top surface moves left.
    AntiClockwise,
}

impl Rotation {
    /// Horizontal direction the belt carries whatever stands on it.
    pub fn direction(self) -> f64 {
        match self {
            Rotation::Clockwise => 1.0,
            Rotation::AntiClockwise => -1.0,
        }
    }
}

/// What a conveyor tile stores: which pair, which half of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConveyorRef {
    pub id: ConveyorId,
    pub rotation: Rotation,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ConveyorDef {
    pub id: ConveyorId,
    pub rotation: Rotation,
}

/// Conveyor definitions always exist as a clockwise / anti-clockwise pair
/// per id; `allocate` is the only way in.
#[derive(Clone, Debug, Default)]
pub struct ConveyorRegistry {
    pairs: BTreeMap<ConveyorId, [ConveyorDef; 2]>,
}

impl ConveyorRegistry {
    pub fn new() -> Self {
        ConveyorRegistry::default()
    }

    /// Allocate both halves of pair `id`. Returns None if it already exists.
    pub fn allocate(&mut self, id: ConveyorId) -> Option<[ConveyorRef; 2]> {
        if self.pairs.contains_key(&id) { return None; }
        self.pairs.insert(id, [
            ConveyorDef { id, rotation: Rotation::Clockwise },
            ConveyorDef { id, rotation: Rotation::AntiClockwise },
        ]);
        Some([
            ConveyorRef { id, rotation: Rotation::Clockwise },
            ConveyorRef { id, rotation: Rotation::AntiClockwise },
        ])
    }

    pub fn get(&self, r: ConveyorRef) -> Option<&ConveyorDef> {
        self.pairs.get(&r.id)?.iter().find(|d| d.rotation == r.rotation)
    }

    pub fn contains(&self, id: ConveyorId) -> bool {
        self.pairs.contains_key(&id)
    }
}

// ══════════════════════════════════════════════════════════════
// Sound catalog
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoundEffect {
    Jump,
    Land,
    Pickup,
    Key,
    PowerUp,
    PowerupWarning,
    Explode,
    Die,
    Conveyor,
    Teleport,
    Win,
    Lose,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayMode {
    Once,
    Loop,
}

// ══════════════════════════════════════════════════════════════
// Goodies
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoodieKind {
    Coin,
    Gem,
    Key,
    Medkit,
    ExtraLife,
    Shield,
    Wings,
    Triple,
}

/// What collecting a goodie does beyond awarding its score.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoodieEffect {
    None,
    Key,
    Heal(u32),
    ExtraLife,
    Powerup(PowerupKind),
}

impl GoodieKind {
    /// Base score before any multiplier.
    pub fn score(self) -> u64 {
        match self {
            GoodieKind::Coin => 10,
            GoodieKind::Gem => 100,
            GoodieKind::Key => 50,
            GoodieKind::Medkit => 0,
            GoodieKind::ExtraLife => 0,
            GoodieKind::Shield | GoodieKind::Wings | GoodieKind::Triple => 25,
        }
    }

    pub fn sound(self) -> SoundEffect {
        match self {
            GoodieKind::Coin | GoodieKind::Gem | GoodieKind::Medkit => SoundEffect::Pickup,
            GoodieKind::Key => SoundEffect::Key,
            GoodieKind::ExtraLife
            | GoodieKind::Shield
            | GoodieKind::Wings
            | GoodieKind::Triple => SoundEffect::PowerUp,
        }
    }

    /// Persistent goodies are gone for good once taken; the rest reappear
    /// when their screen resets.
    pub fn persistent(self) -> bool {
        !matches!(self, GoodieKind::Medkit)
    }

    pub fn effect(self) -> GoodieEffect {
        match self {
            GoodieKind::Coin | GoodieKind::Gem => GoodieEffect::None,
            GoodieKind::Key => GoodieEffect::Key,
            GoodieKind::Medkit => GoodieEffect::Heal(25),
            GoodieKind::ExtraLife => GoodieEffect::ExtraLife,
            GoodieKind::Shield => GoodieEffect::Powerup(PowerupKind::Shield),
            GoodieKind::Wings => GoodieEffect::Powerup(PowerupKind::Wings),
            GoodieKind::Triple => GoodieEffect::Powerup(PowerupKind::ScoreMultiplier(3)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Goodie {
    pub kind: GoodieKind,
    pub screen: ScreenId,
    pub row: usize,
    pub col: usize,
    /// Collected during the current visit to its screen.
    pub taken: bool,
    /// Collected for good (persistent kinds only).
    pub dead: bool,
}

impl Goodie {
    pub fn new(kind: GoodieKind, screen: ScreenId, row: usize, col: usize) -> Self {
        Goodie { kind, screen, row, col, taken: false, dead: false }
    }

    pub fn is_available(&self) -> bool {
        !self.taken && !self.dead
    }

    /// Mark as collected. Returns false if it was already gone.
    pub fn collect(&mut self) -> bool {
        if !self.is_available() { return false; }
        self.taken = true;
        if self.kind.persistent() {
            self.dead = true;
        }
        true
    }

    /// Screen reset: non-persistent goodies come back.
    pub fn reset(&mut self) {
        if !self.dead {
            self.taken = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conveyors_allocate_as_pairs() {
        let mut reg = ConveyorRegistry::new();
        let [cw, acw] = reg.allocate(7).unwrap();
        assert_eq!(cw.rotation, Rotation::Clockwise);
        assert_eq!(acw.rotation, Rotation::AntiClockwise);
        assert!(reg.get(cw).is_some());
        assert!(reg.get(acw).is_some());
        assert!(reg.allocate(7).is_none());
    }

    #[test]
    fn rotation_direction() {
        assert_eq!(Rotation::Clockwise.direction(), 1.0);
        assert_eq!(Rotation::AntiClockwise.direction(), -1.0);
    }

    #[test]
    fn hazard_replace_requires_existing_id() {
        let mut reg = HazardRegistry::new();
        let def = HazardDef { id: 3, explodes: false, death_anim: DeathAnim::Burn, harmless: false };
        assert!(!reg.replace(def));
        reg.define(def);
        assert!(reg.replace(HazardDef { harmless: true, ..def }));
        assert!(reg.get(3).unwrap().harmless);
    }

    #[test]
    fn persistent_goodie_is_dead_after_collect() {
        let mut g = Goodie::new(GoodieKind::Gem, ScreenId(0), 2, 3);
        assert!(g.collect());
        assert!(!g.collect());
        g.reset();
        assert!(!g.is_available());
    }

    #[test]
    fn medkit_returns_on_reset() {
        let mut g = Goodie::new(GoodieKind::Medkit, ScreenId(0), 2, 3);
        assert!(g.collect());
        assert!(!g.is_available());
        g.reset();
        assert!(g.is_available());
    }
}
