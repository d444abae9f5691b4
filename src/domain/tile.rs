/// Tile cells and the fixed-size grid that holds them.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Stateful cells (hazards, conveyors, collapsibles) carry their state by
/// value inside the cell. Two placements of the same hazard id are two
/// independent state machines: exploding one never touches the other.

use crate::consts::{GRID_COLS, GRID_ROWS, TILE_ANIM_FRAMES, TILE_ANIM_TICKS};

use super::geometry::{col_of, row_of};
use super::registry::{ConveyorRef, HazardId, Rotation};

/// Appearance id for plain tiles; only the renderer cares about it.
pub type TileId = u16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HazardPhase {
    Armed,
    Exploding { remaining: u32 },
    Dead,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HazardState {
    pub phase: HazardPhase,
    pub frame: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollapsePhase {
    Intact,
    Crumbling { remaining: u32 },
    Collapsed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CollapsibleState {
    pub phase: CollapsePhase,
    pub frame: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ConveyorState {
    pub frame: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Solid(TileId),
    Thru(TileId),     // Landable from above only
    Scenic(TileId),   // Drawn, never collides
    Hazard { def: HazardId, state: HazardState },
    Conveyor { conveyor: ConveyorRef, state: ConveyorState },
    Collapsible { id: TileId, state: CollapsibleState },
}

impl Tile {
    pub fn hazard(def: HazardId) -> Self {
        Tile::Hazard { def, state: HazardState { phase: HazardPhase::Armed, frame: 0 } }
    }

    pub fn conveyor(conveyor: ConveyorRef) -> Self {
        Tile::Conveyor { conveyor, state: ConveyorState { frame: 0 } }
    }

    pub fn collapsible(id: TileId) -> Self {
        Tile::Collapsible { id, state: CollapsibleState { phase: CollapsePhase::Intact, frame: 0 } }
    }

    /// Blocks from every side.
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Solid(_) | Tile::Conveyor { .. })
    }

    /// Blocks only a character coming down onto it.
    pub fn is_thru(self) -> bool {
        match self {
            Tile::Thru(_) => true,
            Tile::Collapsible { state, .. } => state.phase != CollapsePhase::Collapsed,
            _ => false,
        }
    }

    /// Can the character stand on it?
    pub fn is_landable(self) -> bool {
        self.is_solid() || self.is_thru()
    }

    pub fn is_armed_hazard(self) -> bool {
        matches!(self, Tile::Hazard { state: HazardState { phase: HazardPhase::Armed, .. }, .. })
    }

    pub fn is_intact_collapsible(self) -> bool {
        matches!(
            self,
            Tile::Collapsible { state: CollapsibleState { phase: CollapsePhase::Intact, .. }, .. }
        )
    }

    /// Return the per-placement state to its pristine value, with the
    /// animation phase seeded from `frame`.
    fn reset_state(&mut self, frame: u8) {
        match self {
            Tile::Hazard { state, .. } => {
                *state = HazardState { phase: HazardPhase::Armed, frame };
            }
            Tile::Conveyor { state, .. } => state.frame = frame,
            Tile::Collapsible { state, .. } => {
                *state = CollapsibleState { phase: CollapsePhase::Intact, frame };
            }
            _ => {}
        }
    }

    /// One tile tick: countdowns always, animation frames when `animate`.
    fn tick(&mut self, animate: bool) {
        let step = |f: &mut u8, dir: i8| {
            *f = (*f as i16 + dir as i16).rem_euclid(TILE_ANIM_FRAMES as i16) as u8;
        };
        match self {
            Tile::Hazard { state, .. } => {
                if let HazardPhase::Exploding { remaining } = state.phase {
                    state.phase = if remaining <= 1 {
                        HazardPhase::Dead
                    } else {
                        HazardPhase::Exploding { remaining: remaining - 1 }
                    };
                }
                if animate && state.phase != HazardPhase::Dead {
                    step(&mut state.frame, 1);
                }
            }
            Tile::Conveyor { conveyor, state } => {
                if animate {
                    let dir = match conveyor.rotation {
                        Rotation::Clockwise => 1,
                        Rotation::AntiClockwise => -1,
                    };
                    step(&mut state.frame, dir);
                }
            }
            Tile::Collapsible { state, .. } => {
                if let CollapsePhase::Crumbling { remaining } = state.phase {
                    state.phase = if remaining <= 1 {
                        CollapsePhase::Collapsed
                    } else {
                        CollapsePhase::Crumbling { remaining: remaining - 1 }
                    };
                    if animate {
                        step(&mut state.frame, 1);
                    }
                }
            }
            _ => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Grid
// ══════════════════════════════════════════════════════════════

/// 32×20 arena of tile cells, row-major.
///
/// Queries take signed coordinates; anything outside the grid reads as
/// `Tile::Empty`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    cells: Vec<Tile>,
    anim_clock: u32,
}

impl Default for TileGrid {
    fn default() -> Self {
        TileGrid::new()
    }
}

impl TileGrid {
    pub fn new() -> Self {
        TileGrid { cells: vec![Tile::Empty; GRID_ROWS * GRID_COLS], anim_clock: 0 }
    }

    #[inline]
    fn index(row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row as usize >= GRID_ROWS || col as usize >= GRID_COLS {
            return None;
        }
        Some(row as usize * GRID_COLS + col as usize)
    }

    pub fn tile_at_cell(&self, row: i32, col: i32) -> Tile {
        Self::index(row, col).map_or(Tile::Empty, |i| self.cells[i])
    }

    pub fn tile_at_pixel(&self, x: i32, y: i32) -> Tile {
        self.tile_at_cell(row_of(y), col_of(x))
    }

    /// Overwrite a cell. Returns false (and does nothing) outside the grid.
    pub fn set(&mut self, row: i32, col: i32, tile: Tile) -> bool {
        match Self::index(row, col) {
            Some(i) => { self.cells[i] = tile; true }
            None => false,
        }
    }

    pub fn get_mut(&mut self, row: i32, col: i32) -> Option<&mut Tile> {
        Self::index(row, col).map(|i| &mut self.cells[i])
    }

    /// Iterate all cells as ((row, col), tile).
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), Tile)> + '_ {
        self.cells.iter().enumerate().map(|(i, t)| {
            (((i / GRID_COLS) as i32, (i % GRID_COLS) as i32), *t)
        })
    }

    /// Hazards re-arm, collapsibles restore, and animation phases are
    /// re-seeded in a checkerboard so neighbouring tiles are out of step.
    pub fn reset(&mut self) {
        self.anim_clock = 0;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let (row, col) = (i / GRID_COLS, i % GRID_COLS);
            let frame = if (row + col) % 2 == 0 { 0 } else { TILE_ANIM_FRAMES / 2 };
            cell.reset_state(frame);
        }
    }

    /// Advance every cell by one simulation tick.
    pub fn tick(&mut self) {
        self.anim_clock = self.anim_clock.wrapping_add(1);
        let animate = self.anim_clock % TILE_ANIM_TICKS == 0;
        for cell in &mut self.cells {
            cell.tick(animate);
        }
    }

    /// Start the explosion of an armed hazard. Returns false if the cell is
    /// not an armed hazard.
    pub fn explode_hazard(&mut self, row: i32, col: i32, ticks: u32) -> bool {
        match self.get_mut(row, col) {
            Some(Tile::Hazard { state, .. }) if state.phase == HazardPhase::Armed => {
                state.phase = HazardPhase::Exploding { remaining: ticks.max(1) };
                true
            }
            _ => false,
        }
    }

    /// Start crumbling an intact collapsible. Returns false otherwise.
    pub fn trigger_collapse(&mut self, row: i32, col: i32, ticks: u32) -> bool {
        match self.get_mut(row, col) {
            Some(Tile::Collapsible { state, .. }) if state.phase == CollapsePhase::Intact => {
                state.phase = CollapsePhase::Crumbling { remaining: ticks.max(1) };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cw() -> ConveyorRef {
        ConveyorRef { id: 1, rotation: Rotation::Clockwise }
    }

    #[test]
    fn predicates() {
        assert!(Tile::Solid(1).is_solid());
        assert!(Tile::conveyor(cw()).is_solid());
        assert!(!Tile::Thru(1).is_solid());
        assert!(Tile::Thru(1).is_landable());
        assert!(Tile::collapsible(1).is_thru());
        assert!(!Tile::hazard(1).is_landable());
        assert!(!Tile::Scenic(1).is_landable());
        assert!(!Tile::Empty.is_landable());
    }

    #[test]
    fn collapsed_collapsible_is_passable() {
        let mut g = TileGrid::new();
        g.set(5, 5, Tile::collapsible(2));
        assert!(g.trigger_collapse(5, 5, 3));
        assert!(g.tile_at_cell(5, 5).is_thru());
        for _ in 0..3 { g.tick(); }
        assert!(!g.tile_at_cell(5, 5).is_landable());
        assert!(!g.trigger_collapse(5, 5, 3));
    }

    #[test]
    fn hazards_sharing_an_id_have_independent_state() {
        let mut g = TileGrid::new();
        g.set(3, 3, Tile::hazard(9));
        g.set(3, 4, Tile::hazard(9));
        assert!(g.explode_hazard(3, 3, 2));
        assert!(!g.tile_at_cell(3, 3).is_armed_hazard());
        assert!(g.tile_at_cell(3, 4).is_armed_hazard());
        g.tick();
        g.tick();
        assert!(matches!(
            g.tile_at_cell(3, 3),
            Tile::Hazard { state: HazardState { phase: HazardPhase::Dead, .. }, .. }
        ));
        assert!(g.tile_at_cell(3, 4).is_armed_hazard());
    }

    #[test]
    fn reset_rearms_and_staggers() {
        let mut g = TileGrid::new();
        g.set(0, 0, Tile::hazard(1));
        g.set(0, 1, Tile::hazard(1));
        g.set(1, 0, Tile::collapsible(1));
        g.explode_hazard(0, 0, 5);
        g.trigger_collapse(1, 0, 1);
        g.tick();
        g.reset();
        assert!(g.tile_at_cell(0, 0).is_armed_hazard());
        assert!(g.tile_at_cell(1, 0).is_intact_collapsible());
        let frame = |t: Tile| match t {
            Tile::Hazard { state, .. } => state.frame,
            Tile::Collapsible { state, .. } => state.frame,
            _ => unreachable!(),
        };
        assert_eq!(frame(g.tile_at_cell(0, 0)), 0);
        assert_eq!(frame(g.tile_at_cell(0, 1)), TILE_ANIM_FRAMES / 2);
        assert_eq!(frame(g.tile_at_cell(1, 0)), TILE_ANIM_FRAMES / 2);
    }

    #[test]
    fn conveyor_frames_follow_rotation() {
        let mut g = TileGrid::new();
        g.set(0, 0, Tile::conveyor(cw()));
        g.set(0, 2, Tile::conveyor(ConveyorRef { id: 1, rotation: Rotation::AntiClockwise }));
        for _ in 0..TILE_ANIM_TICKS { g.tick(); }
        let frame = |t: Tile| match t {
            Tile::Conveyor { state, .. } => state.frame,
            _ => unreachable!(),
        };
        assert_eq!(frame(g.tile_at_cell(0, 0)), 1);
        assert_eq!(frame(g.tile_at_cell(0, 2)), TILE_ANIM_FRAMES - 1);
    }

    #[test]
    fn pixel_lookup_maps_to_cells() {
        let mut g = TileGrid::new();
        g.set(2, 3, Tile::Solid(1));
        assert!(g.tile_at_pixel(60, 40).is_solid());
        assert!(g.tile_at_pixel(79, 59).is_solid());
        assert!(!g.tile_at_pixel(80, 59).is_solid());
        assert!(!g.set(20, 0, Tile::Solid(1)));
    }

    proptest! {
        #[test]
        fn out_of_range_is_empty(x in -5000i32..5000, y in -5000i32..5000) {
            let mut g = TileGrid::new();
            for r in 0..GRID_ROWS as i32 {
                for c in 0..GRID_COLS as i32 {
                    g.set(r, c, Tile::Solid(1));
                }
            }
            let inside = (0..640).contains(&x) && (0..400).contains(&y);
            prop_assert_eq!(g.tile_at_pixel(x, y) == Tile::Empty, !inside);
        }
    }
}
