/// A screen: one 32×20 room with its tiles, sprites and the positional
/// records respawn relies on.

use crate::consts::{TILE_H, TILE_W};
use crate::domain::character::Momentum;
use crate::domain::geometry::{PixelRect, ScreenId};
use crate::domain::sprite::Sprite;
use crate::domain::tile::TileGrid;

/// Where and how the character entered a screen.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CameFrom {
    pub x: f64,
    pub y: f64,
    pub momentum: Momentum,
}

#[derive(Clone, Debug)]
pub struct Screen {
    pub id: ScreenId,
    pub grid: TileGrid,
    pub background: u16,
    pub sprites: Vec<Sprite>,
    /// Designer start tile, as (row, col).
    pub start: (usize, usize),
    pub came_from: Option<CameFrom>,
    /// Last spot the character landed on and survived. Cleared on reset.
    pub last_on_ground: Option<(f64, f64)>,
}

impl Screen {
    pub fn new(id: ScreenId) -> Self {
        Screen {
            id,
            grid: TileGrid::new(),
            background: 0,
            sprites: Vec::new(),
            start: (0, 0),
            came_from: None,
            last_on_ground: None,
        }
    }

    /// Pixel position of the start tile.
    pub fn start_point(&self) -> (f64, f64) {
        ((self.start.1 as i32 * TILE_W) as f64, (self.start.0 as i32 * TILE_H) as f64)
    }

    /// Restore tiles and sprites to their initial state.
    pub fn reset(&mut self) {
        self.grid.reset();
        for s in &mut self.sprites {
            s.reset();
        }
        self.last_on_ground = None;
    }

    /// Advance tile and sprite animation by one tick.
    pub fn tick(&mut self) {
        self.grid.tick();
        for s in &mut self.sprites {
            s.tick();
        }
    }

    /// First visible harmful or draining sprite whose box touches `rect`.
    pub fn lethal_sprite_in(&self, rect: &PixelRect) -> Option<&Sprite> {
        self.sprites
            .iter()
            .find(|s| s.visible && s.is_lethal() && s.bbox().intersects(rect))
    }

    /// Would a character box at (x, y) be clear of every lethal sprite?
    pub fn is_sprite_safe(&self, x: f64, y: f64) -> bool {
        self.lethal_sprite_in(&PixelRect::character_at(x, y)).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sprite::{SheetId, SpriteKind};
    use crate::domain::tile::Tile;

    fn harmful_at(x: f64, y: f64) -> Sprite {
        Sprite::new(SheetId(9), (20, 20), (x, y), PixelRect::new(0, 0, 640, 400), (0.0, 0.0), SpriteKind::Harmful)
    }

    #[test]
    fn start_point_is_tile_origin() {
        let mut s = Screen::new(ScreenId(0));
        s.start = (4, 7);
        assert_eq!(s.start_point(), (140.0, 80.0));
    }

    #[test]
    fn sprite_safety_ignores_hidden_and_harmless() {
        let mut s = Screen::new(ScreenId(0));
        s.sprites.push(harmful_at(100.0, 100.0));
        assert!(!s.is_sprite_safe(90.0, 90.0));
        assert!(s.is_sprite_safe(140.0, 100.0));

        s.sprites[0].visible = false;
        assert!(s.is_sprite_safe(90.0, 90.0));

        s.sprites[0].visible = true;
        s.sprites[0].kind = SpriteKind::Scenery;
        assert!(s.is_sprite_safe(90.0, 90.0));
    }

    #[test]
    fn reset_clears_last_on_ground_and_rearms() {
        let mut s = Screen::new(ScreenId(0));
        s.grid.set(3, 3, Tile::hazard(1));
        s.grid.explode_hazard(3, 3, 4);
        s.last_on_ground = Some((10.0, 10.0));
        s.reset();
        assert!(s.last_on_ground.is_none());
        assert!(s.grid.tile_at_cell(3, 3).is_armed_hazard());
    }
}
