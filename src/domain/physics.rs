/// Collision queries against a `TileGrid` for the 40×40 character box.
///
/// ## Sampling
///
/// The box is never tested cell-by-cell except for `overlaps_solid`.
/// Ground, side and ceiling checks sample a handful of pixels on the
/// relevant edge:
///
///   ground   four x samples, inset 3px, on the row just below the feet
///   side     three y samples (top+4, middle, bottom−5) on the leading edge
///   ceiling  six x samples on the target top row
///
/// ## Thru tiles
///
/// Thru tiles (and intact collapsibles) only stop a character coming down
/// onto them. A thru sample counts as ground when the feet are exactly on a
/// tile boundary, or when the previous tick's feet were at or above the tile
/// top. A character that jumped up into one from below falls through it.

use smallvec::SmallVec;

use crate::consts::{CHAR_H, CHAR_W, TILE_H, TILE_W};

use super::geometry::{col_of, row_of};
use super::registry::{ConveyorRef, Rotation};
use super::tile::{Tile, TileGrid};

/// x offsets of the ground samples inside the box.
pub const GROUND_SAMPLE_XS: [i32; 4] = [3, 14, 25, 36];

/// y offsets of the side samples inside the box.
const SIDE_SAMPLE_YS: [i32; 3] = [4, CHAR_H / 2, CHAR_H - 5];

/// x offsets of the ceiling samples inside the box; the first and last are
/// the outer pair, the rest are interior.
const CEILING_SAMPLE_XS: [i32; 6] = [1, 8, 15, 23, 30, 38];

// ══════════════════════════════════════════════════════════════
// Ground
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum GroundState {
    /// Moving upward: never grounded, whatever is underneath.
    Rising,
    Airborne,
    Grounded {
        /// How far the feet are below the tile top (0 = flush).
        penetration: i32,
        conveyor: Option<ConveyorRef>,
        /// Intact collapsibles under the feet, as (row, col).
        collapsibles: SmallVec<[(i32, i32); 4]>,
    },
}

impl GroundState {
    pub fn is_grounded(&self) -> bool {
        matches!(self, GroundState::Grounded { .. })
    }
}

/// Classify what is under a box at (x, y) moving with vertical speed `vy`.
///
/// `prev_y` is the box's y on the previous tick (for thru tiles).
/// `active` is the rotation of the conveyor the character is already on, if
/// any; a sample matching it is preferred so a belt seam does not flip the
/// carry direction.
pub fn resolve_ground(
    grid: &TileGrid,
    x: f64,
    y: f64,
    vy: f64,
    prev_y: f64,
    active: Option<Rotation>,
) -> GroundState {
    if vy < 0.0 {
        return GroundState::Rising;
    }

    let sy = y.floor() as i32 + CHAR_H;
    let penetration = sy.rem_euclid(TILE_H);
    let tile_top = row_of(sy) * TILE_H;
    let thru_ok = penetration == 0 || prev_y.floor() as i32 + CHAR_H <= tile_top;

    let x0 = x.floor() as i32;
    let mut landed = false;
    let mut conveyors: SmallVec<[ConveyorRef; 4]> = SmallVec::new();
    let mut collapsibles: SmallVec<[(i32, i32); 4]> = SmallVec::new();

    for off in GROUND_SAMPLE_XS {
        let sx = x0 + off;
        let tile = grid.tile_at_pixel(sx, sy);
        if tile.is_solid() {
            landed = true;
            if let Tile::Conveyor { conveyor, .. } = tile {
                conveyors.push(conveyor);
            }
        } else if tile.is_thru() && thru_ok {
            landed = true;
            if tile.is_intact_collapsible() {
                let cell = (row_of(sy), col_of(sx));
                if !collapsibles.contains(&cell) {
                    collapsibles.push(cell);
                }
            }
        }
    }

    if !landed {
        return GroundState::Airborne;
    }

    let conveyor = active
        .and_then(|rot| conveyors.iter().copied().find(|c| c.rotation == rot))
        .or_else(|| conveyors.first().copied());

    GroundState::Grounded { penetration, conveyor, collapsibles }
}

// ══════════════════════════════════════════════════════════════
// Sides
// ══════════════════════════════════════════════════════════════

/// Is there a solid tile on pixel column `lead_x` beside a box at height `y`?
pub fn solid_to_side(grid: &TileGrid, lead_x: i32, y: f64) -> bool {
    let y0 = y.floor() as i32;
    SIDE_SAMPLE_YS.iter().any(|&off| grid.tile_at_pixel(lead_x, y0 + off).is_solid())
}

/// Move a box horizontally by `dx`, stopping flush against a solid.
/// Returns the new x and whether the move was blocked.
pub fn move_horizontal(grid: &TileGrid, x: f64, y: f64, dx: f64) -> (f64, bool) {
    if dx == 0.0 {
        return (x, false);
    }
    let nx = x + dx;
    if dx > 0.0 {
        let lead = nx.floor() as i32 + CHAR_W - 1;
        if solid_to_side(grid, lead, y) {
            return ((col_of(lead) * TILE_W - CHAR_W) as f64, true);
        }
    } else {
        let lead = nx.floor() as i32;
        if solid_to_side(grid, lead, y) {
            return (((col_of(lead) + 1) * TILE_W) as f64, true);
        }
    }
    (nx, false)
}

// ══════════════════════════════════════════════════════════════
// Ceiling
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Ceiling {
    Clear,
    /// Only an outer corner clipped a tile: slide onto this column-aligned x.
    Recenter(f64),
    /// Hit a tile on `row`; the caller snaps below it.
    Blocked { row: i32 },
}

fn ceiling_hits(grid: &TileGrid, x0: i32, top: i32) -> [bool; 6] {
    CEILING_SAMPLE_XS.map(|off| grid.tile_at_pixel(x0 + off, top).is_solid())
}

/// Test the row a rising box at x is about to move its top edge into.
pub fn solid_to_up(grid: &TileGrid, x: f64, y_target: f64) -> Ceiling {
    let top = y_target.floor() as i32;
    let hits = ceiling_hits(grid, x.floor() as i32, top);
    if !hits.iter().any(|&h| h) {
        return Ceiling::Clear;
    }
    let interior_clear = !hits[1..5].iter().any(|&h| h);
    if interior_clear {
        let nx = (x / TILE_W as f64).round() * TILE_W as f64;
        if !ceiling_hits(grid, nx as i32, top).iter().any(|&h| h) {
            return Ceiling::Recenter(nx);
        }
    }
    Ceiling::Blocked { row: row_of(top) }
}

// ══════════════════════════════════════════════════════════════
// Whole-box tests
// ══════════════════════════════════════════════════════════════

/// Does any solid cell intersect the box at (x, y)?
pub fn overlaps_solid(grid: &TileGrid, x: f64, y: f64) -> bool {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    for row in row_of(y0)..=row_of(y0 + CHAR_H - 1) {
        for col in col_of(x0)..=col_of(x0 + CHAR_W - 1) {
            if grid.tile_at_cell(row, col).is_solid() {
                return true;
            }
        }
    }
    false
}

/// How far a conveyor moves a box this tick: the largest magnitude from
/// `speed` down to 0 whose destination does not overlap a solid.
pub fn conveyor_displacement(
    grid: &TileGrid,
    x: f64,
    y: f64,
    rotation: Rotation,
    speed: u32,
) -> f64 {
    let dir = rotation.direction();
    (1..=speed)
        .rev()
        .map(|m| m as f64 * dir)
        .find(|&dx| !overlaps_solid(grid, x + dx, y))
        .unwrap_or(0.0)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
