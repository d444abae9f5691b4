/// Pixel rectangles, pixel↔cell conversion and the screen-id neighbour
/// convention.
///
/// ## Coordinates
///
/// Pixel space: (0, 0) is the top-left of the screen, y grows downward.
/// Cell space: (row, col), row = y / TILE_H, col = x / TILE_W. Cell math uses
/// euclidean division so negative pixels map to negative (out-of-grid) cells
/// instead of collapsing onto row/col 0.

use smallvec::SmallVec;

use crate::consts::{CHAR_H, CHAR_W, TILE_H, TILE_W};

// ── Screen ids ──

/// Screen identifier. Neighbours follow a fixed offset convention:
/// ±1 horizontally, ±`SCREEN_ROW_STRIDE` vertically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ScreenId(pub i32);

/// The reserved id of the screen a session starts on.
pub const FIRST_SCREEN: ScreenId = ScreenId(0);

pub const SCREEN_ROW_STRIDE: i32 = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl ScreenId {
    pub fn neighbour(self, edge: Edge) -> ScreenId {
        match edge {
            Edge::Left => ScreenId(self.0 - 1),
            Edge::Right => ScreenId(self.0 + 1),
            Edge::Top => ScreenId(self.0 - SCREEN_ROW_STRIDE),
            Edge::Bottom => ScreenId(self.0 + SCREEN_ROW_STRIDE),
        }
    }
}

// ── Rectangles ──

/// Integer pixel rectangle, half-open: covers `x..x+w` × `y..y+h`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        PixelRect { x, y, w, h }
    }

    /// Rectangle of size `w`×`h` whose origin is the floor of a sub-pixel point.
    pub fn at(x: f64, y: f64, w: i32, h: i32) -> Self {
        PixelRect { x: x.floor() as i32, y: y.floor() as i32, w, h }
    }

    /// The character's 40×40 box at a sub-pixel position.
    pub fn character_at(x: f64, y: f64) -> Self {
        Self::at(x, y, CHAR_W, CHAR_H)
    }

    #[inline]
    pub fn right(&self) -> i32 { self.x + self.w }

    #[inline]
    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty() && !other.is_empty()
            && self.x < other.right() && other.x < self.right()
            && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        if !self.intersects(other) { return None; }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        Some(PixelRect::new(x, y, r - x, b - y))
    }

    /// Does `self` fully contain `other`?
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x >= self.x && other.right() <= self.right()
            && other.y >= self.y && other.bottom() <= self.bottom()
    }
}

// ── Pixel ↔ cell ──

#[inline]
pub fn col_of(px: i32) -> i32 { px.div_euclid(TILE_W) }

#[inline]
pub fn row_of(py: i32) -> i32 { py.div_euclid(TILE_H) }

/// Snap a pixel offset onto a cell: an offset of more than half a tile into
/// a cell counts as the next cell.
#[inline]
fn snapped(px: f64, tile: i32) -> i32 {
    let p = px.floor() as i32;
    let cell = p.div_euclid(tile);
    if p.rem_euclid(tile) > tile / 2 { cell + 1 } else { cell }
}

/// The 2×2 "effective" cells a 40×40 box at (x, y) mostly occupies,
/// as (row, col). May contain out-of-grid cells; tile queries map those
/// to Empty.
pub fn effective_cells(x: f64, y: f64) -> [(i32, i32); 4] {
    let col = snapped(x, TILE_W);
    let row = snapped(y, TILE_H);
    [(row, col), (row, col + 1), (row + 1, col), (row + 1, col + 1)]
}

/// Grid cells under the four quadrant centres of a 40×40 box, deduplicated.
/// Used for goodie pickup.
pub fn quadrant_cells(x: f64, y: f64) -> SmallVec<[(i32, i32); 4]> {
    let cx = x.floor() as i32 + CHAR_W / 2;
    let cy = y.floor() as i32 + CHAR_H / 2;
    let qx = CHAR_W / 4;
    let qy = CHAR_H / 4;
    let mut cells: SmallVec<[(i32, i32); 4]> = SmallVec::new();
    for (dx, dy) in [(-qx, -qy), (qx, -qy), (-qx, qy), (qx, qy)] {
        let cell = (row_of(cy + dy), col_of(cx + dx));
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbour_convention() {
        let id = ScreenId(2003);
        assert_eq!(id.neighbour(Edge::Left), ScreenId(2002));
        assert_eq!(id.neighbour(Edge::Right), ScreenId(2004));
        assert_eq!(id.neighbour(Edge::Top), ScreenId(1003));
        assert_eq!(id.neighbour(Edge::Bottom), ScreenId(3003));
        assert_eq!(FIRST_SCREEN.neighbour(Edge::Left), ScreenId(-1));
    }

    #[test]
    fn rect_intersection() {
        let a = PixelRect::new(0, 0, 40, 40);
        let b = PixelRect::new(30, 35, 40, 40);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Some(PixelRect::new(30, 35, 10, 5)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = PixelRect::new(0, 0, 40, 40);
        let b = PixelRect::new(40, 0, 40, 40);
        assert!(!a.intersects(&b));
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn negative_pixels_map_to_negative_cells() {
        assert_eq!(col_of(-1), -1);
        assert_eq!(row_of(-20), -1);
        assert_eq!(row_of(-21), -2);
        assert_eq!(col_of(19), 0);
        assert_eq!(col_of(20), 1);
    }

    #[test]
    fn effective_cells_aligned() {
        assert_eq!(effective_cells(40.0, 60.0), [(3, 2), (3, 3), (4, 2), (4, 3)]);
    }

    #[test]
    fn effective_cells_snap_past_half_tile() {
        // 10px into a cell stays, 11px snaps forward
        assert_eq!(effective_cells(50.0, 60.0)[0], (3, 2));
        assert_eq!(effective_cells(51.0, 60.0)[0], (3, 3));
        assert_eq!(effective_cells(40.0, 71.5)[0], (4, 2));
    }

    #[test]
    fn quadrant_cells_aligned_box_covers_2x2() {
        let cells = quadrant_cells(40.0, 60.0);
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&(3, 2)));
        assert!(cells.contains(&(4, 3)));
    }

    #[test]
    fn quadrant_cells_offset_box() {
        // Box offset by half a tile: quadrant centres shift one cell over
        let cells = quadrant_cells(10.0, 10.0);
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&(1, 1)));
    }
}
