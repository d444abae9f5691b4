/// Bouncing sprites and pixel-accurate collision.
///
/// A sprite moves by a constant velocity inside a bounce box. An axis is
/// reversed only when the next step would leave the box *and* carry the
/// sprite farther out, so a sprite placed outside its box drifts back in
/// instead of jittering at the edge.

use std::collections::HashMap;

use super::entity::Facing;
use super::geometry::{PixelRect, ScreenId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SheetId(pub u16);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimType {
    /// 0, 1, .., n-1, 0, 1, ..
    Cycle,
    /// 0, 1, .., n-1, n-2, .., 0, 1, ..
    Oscillate,
    Still,
}

/// Ticks per animation frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimSpeed {
    Slow,
    Normal,
    Fast,
}

impl AnimSpeed {
    pub fn ticks_per_frame(self) -> u32 {
        match self {
            AnimSpeed::Slow => 8,
            AnimSpeed::Normal => 4,
            AnimSpeed::Fast => 2,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteKind {
    /// Kills on contact.
    Harmful,
    /// Takes `per_tick` health each tick of contact.
    Drain { per_tick: u32 },
    /// Wins the game once every key is held.
    ExitDoor,
    /// Transfers to `target`'s start tile.
    BonusDoor { target: ScreenId },
    Scenery,
}

/// Image collaborator: sheet sizes and raw alpha.
pub trait ImageMetrics {
    /// Pixel size (w, h) of a sheet, or None if the sheet is unknown.
    fn sheet_size(&self, sheet: SheetId) -> Option<(u32, u32)>;
    /// Alpha at a sheet pixel; 0 outside the sheet.
    fn alpha(&self, sheet: SheetId, x: i32, y: i32) -> u8;
}

#[derive(Clone, Debug)]
pub struct Sprite {
    pub sheet: SheetId,
    pub frame_w: i32,
    pub frame_h: i32,
    pub start: (f64, f64),
    start_velocity: (f64, f64),
    pub bounds: PixelRect,
    pub pos: (f64, f64),
    pub velocity: (f64, f64),
    pub kind: SpriteKind,
    pub anim: AnimType,
    pub speed: AnimSpeed,
    pub forced_facing: Option<Facing>,
    start_visible: bool,
    pub visible: bool,
    frames: i32,
    two_rows: bool,
    frame: i32,
    frame_dir: i32,
    row: i32,
    anim_clock: u32,
}

impl Sprite {
    pub fn new(
        sheet: SheetId,
        frame_size: (i32, i32),
        start: (f64, f64),
        bounds: PixelRect,
        velocity: (f64, f64),
        kind: SpriteKind,
    ) -> Self {
        Sprite {
            sheet,
            frame_w: frame_size.0,
            frame_h: frame_size.1,
            start,
            start_velocity: velocity,
            bounds,
            pos: start,
            velocity,
            kind,
            anim: AnimType::Cycle,
            speed: AnimSpeed::Normal,
            forced_facing: None,
            start_visible: true,
            visible: true,
            frames: 1,
            two_rows: false,
            frame: 0,
            frame_dir: 1,
            row: 0,
            anim_clock: 0,
        }
    }

    pub fn with_anim(mut self, anim: AnimType, speed: AnimSpeed) -> Self {
        self.anim = anim;
        self.speed = speed;
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.forced_facing = Some(facing);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.start_visible = false;
        self.visible = false;
        self
    }

    /// Read the frame count and row layout from the sheet size.
    pub fn init_frames(&mut self, metrics: &dyn ImageMetrics) {
        let (w, h) = metrics.sheet_size(self.sheet).unwrap_or((0, 0));
        self.frames = (w as i32 / self.frame_w.max(1)).max(1);
        self.two_rows = h as i32 >= self.frame_h * 2;
        self.frame = self.frame.min(self.frames - 1);
    }

    pub fn frames(&self) -> i32 { self.frames }

    pub fn has_two_rows(&self) -> bool { self.two_rows }

    pub fn reset(&mut self) {
        self.pos = self.start;
        self.velocity = self.start_velocity;
        self.visible = self.start_visible;
        self.frame = 0;
        self.frame_dir = 1;
        self.row = 0;
        self.anim_clock = 0;
    }

    pub fn bbox(&self) -> PixelRect {
        PixelRect::at(self.pos.0, self.pos.1, self.frame_w, self.frame_h)
    }

    pub fn clip(&self) -> PixelRect {
        PixelRect::new(self.frame * self.frame_w, self.row * self.frame_h, self.frame_w, self.frame_h)
    }

    pub fn placed(&self) -> Placed {
        Placed { sheet: self.sheet, bbox: self.bbox(), clip: self.clip() }
    }

    /// Can touching it hurt? Used by the respawn safety test.
    pub fn is_lethal(&self) -> bool {
        matches!(self.kind, SpriteKind::Harmful | SpriteKind::Drain { .. })
    }

    pub fn tick(&mut self) {
        self.step_motion();
        self.step_anim();
    }

    fn step_motion(&mut self) {
        let b = self.bounds;
        let (lo_x, hi_x) = (b.x as f64, (b.right() - self.frame_w) as f64);
        let (lo_y, hi_y) = (b.y as f64, (b.bottom() - self.frame_h) as f64);
        let (x, vx) = bounce_axis(self.pos.0, self.velocity.0, lo_x, hi_x);
        let (y, vy) = bounce_axis(self.pos.1, self.velocity.1, lo_y, hi_y);
        self.pos = (x, y);
        self.velocity = (vx, vy);
    }

    fn step_anim(&mut self) {
        if self.two_rows {
            let facing = self.forced_facing.or(if self.velocity.0 < 0.0 {
                Some(Facing::Left)
            } else if self.velocity.0 > 0.0 {
                Some(Facing::Right)
            } else {
                None
            });
            if let Some(f) = facing {
                self.row = if f == Facing::Left { 1 } else { 0 };
            }
        }

        if self.anim == AnimType::Still || self.frames <= 1 {
            return;
        }
        self.anim_clock += 1;
        if self.anim_clock < self.speed.ticks_per_frame() {
            return;
        }
        self.anim_clock = 0;
        match self.anim {
            AnimType::Cycle => self.frame = (self.frame + 1) % self.frames,
            AnimType::Oscillate => {
                let next = self.frame + self.frame_dir;
                if next < 0 || next >= self.frames {
                    self.frame_dir = -self.frame_dir;
                }
                self.frame += self.frame_dir;
            }
            AnimType::Still => {}
        }
    }
}

/// One axis of bounce motion. `lo`/`hi` bound the sprite's origin.
fn bounce_axis(p: f64, v: f64, lo: f64, hi: f64) -> (f64, f64) {
    let np = p + v;
    let farther_out = (v < 0.0 && np < lo) || (v > 0.0 && np > hi);
    if farther_out { (p, -v) } else { (np, v) }
}

// ══════════════════════════════════════════════════════════════
// Pixel collision
// ══════════════════════════════════════════════════════════════

/// An alpha map for one sheet.
#[derive(Clone, Debug)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    pub fn opaque(width: u32, height: u32) -> Self {
        AlphaMask { width, height, alpha: vec![255; (width * height) as usize] }
    }

    /// '#' is opaque, anything else transparent. Short rows are padded.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let height = rows.len() as u32;
        let mut alpha = vec![0; (width * height) as usize];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    alpha[y * width as usize + x] = 255;
                }
            }
        }
        AlphaMask { width, height, alpha }
    }

    pub fn at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.alpha[y as usize * self.width as usize + x as usize]
    }
}

/// In-memory `ImageMetrics`: one alpha mask per sheet.
#[derive(Clone, Debug, Default)]
pub struct MaskLibrary {
    masks: HashMap<SheetId, AlphaMask>,
}

impl MaskLibrary {
    pub fn new() -> Self {
        MaskLibrary::default()
    }

    pub fn insert(&mut self, sheet: SheetId, mask: AlphaMask) {
        self.masks.insert(sheet, mask);
    }

    pub fn with(mut self, sheet: SheetId, mask: AlphaMask) -> Self {
        self.insert(sheet, mask);
        self
    }
}

impl ImageMetrics for MaskLibrary {
    fn sheet_size(&self, sheet: SheetId) -> Option<(u32, u32)> {
        self.masks.get(&sheet).map(|m| (m.width, m.height))
    }

    fn alpha(&self, sheet: SheetId, x: i32, y: i32) -> u8 {
        self.masks.get(&sheet).map_or(0, |m| m.at(x, y))
    }
}

/// Something drawn on screen: where it is and which part of its sheet shows.
#[derive(Clone, Copy, Debug)]
pub struct Placed {
    pub sheet: SheetId,
    pub bbox: PixelRect,
    pub clip: PixelRect,
}

/// Boxes intersect and at least one aligned pixel pair is non-transparent
/// in both images.
pub fn pixels_collide(metrics: &dyn ImageMetrics, a: &Placed, b: &Placed) -> bool {
    let Some(overlap) = a.bbox.intersection(&b.bbox) else { return false };
    for py in overlap.y..overlap.bottom() {
        for px in overlap.x..overlap.right() {
            let aa = metrics.alpha(a.sheet, a.clip.x + px - a.bbox.x, a.clip.y + py - a.bbox.y);
            if aa == 0 {
                continue;
            }
            let ba = metrics.alpha(b.sheet, b.clip.x + px - b.bbox.x, b.clip.y + py - b.bbox.y);
            if ba != 0 {
                return true;
            }
        }
    }
    false
}
